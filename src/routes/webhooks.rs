use std::sync::Arc;
use crate::config::Config;
use crate::error::AppResult;
use crate::identity::ApiKeyHeader;
use crate::models::{RegisterWebhook, WebhookListResponse};
use crate::store::Store;
use crate::webhooks;
use rocket::serde::json::Json;
use rocket::{delete, get, post, State};

#[derive(Debug, serde::Serialize)]
pub struct WebhookRegisterResponse {
    pub webhook_id: String,
}

#[post("/v1/webhooks", format = "json", data = "<body>")]
pub fn webhook_register(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    body: Json<RegisterWebhook>,
) -> AppResult<Json<WebhookRegisterResponse>> {
    let agent_id = super::authed(store, config, &key)?;
    let webhook_id = webhooks::register(store, &agent_id, body.into_inner())?;
    Ok(Json(WebhookRegisterResponse { webhook_id }))
}

#[get("/v1/webhooks")]
pub fn webhook_list(store: &State<Arc<Store>>, config: &State<Config>, key: ApiKeyHeader) -> AppResult<Json<WebhookListResponse>> {
    let agent_id = super::authed(store, config, &key)?;
    let webhooks = webhooks::list(store, &agent_id)?;
    Ok(Json(WebhookListResponse { count: webhooks.len(), webhooks }))
}

#[delete("/v1/webhooks/<webhook_id>")]
pub fn webhook_delete(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    webhook_id: &str,
) -> AppResult<Json<serde_json::Value>> {
    let agent_id = super::authed(store, config, &key)?;
    webhooks::delete(store, &agent_id, webhook_id)?;
    Ok(Json(serde_json::json!({"status": "deleted"})))
}
