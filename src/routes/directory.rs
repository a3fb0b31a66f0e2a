use std::sync::Arc;
use crate::config::Config;
use crate::directory;
use crate::error::AppResult;
use crate::identity::ApiKeyHeader;
use crate::models::{AgentProfile, DirectoryListing, UpdateMe};
use crate::store::Store;
use rocket::serde::json::Json;
use rocket::{get, put, State};

#[put("/v1/directory/me", format = "json", data = "<body>")]
pub fn update_me(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    body: Json<UpdateMe>,
) -> AppResult<Json<AgentProfile>> {
    let agent_id = super::authed(store, config, &key)?;
    Ok(Json(directory::update_me(store, &agent_id, body.into_inner())?))
}

#[get("/v1/directory/me")]
pub fn get_me(store: &State<Arc<Store>>, config: &State<Config>, key: ApiKeyHeader) -> AppResult<Json<AgentProfile>> {
    let agent_id = super::authed(store, config, &key)?;
    Ok(Json(directory::get_me(store, &agent_id)?))
}

/// Unauthenticated (spec.md §4.K).
#[get("/v1/directory?<capability>")]
pub fn directory_list(store: &State<Arc<Store>>, capability: Option<&str>) -> AppResult<Json<DirectoryListing>> {
    let agents = directory::list(store, capability)?;
    Ok(Json(DirectoryListing { count: agents.len(), agents }))
}
