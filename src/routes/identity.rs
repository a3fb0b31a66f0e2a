use std::sync::Arc;
use crate::config::Config;
use crate::error::AppResult;
use crate::identity::{self, ApiKeyHeader};
use crate::models::{Heartbeat, RegisterAgent, RegisterResponse};
use crate::store::Store;
use rocket::serde::json::Json;
use rocket::{get, post, State};

#[post("/v1/register", format = "json", data = "<body>")]
pub fn register(store: &State<Arc<Store>>, body: Json<RegisterAgent>) -> AppResult<Json<RegisterResponse>> {
    Ok(Json(identity::register(store, body.into_inner())?))
}

#[post("/v1/heartbeat", format = "json", data = "<body>")]
pub fn heartbeat(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    body: Json<Heartbeat>,
) -> AppResult<Json<serde_json::Value>> {
    let agent_id = super::authed(store, config, &key)?;
    identity::heartbeat(store, &agent_id, body.into_inner())?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}

#[get("/v1/stats")]
pub fn stats(store: &State<Arc<Store>>, config: &State<Config>, key: ApiKeyHeader) -> AppResult<Json<identity::AgentStats>> {
    let agent_id = super::authed(store, config, &key)?;
    Ok(Json(identity::stats(store, &agent_id)?))
}
