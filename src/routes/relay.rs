use std::sync::Arc;
use crate::config::Config;
use crate::error::AppResult;
use crate::events::EventBus;
use crate::identity::ApiKeyHeader;
use crate::models::{InboxResponse, SendMessage, SendMessageResponse};
use crate::relay;
use crate::store::Store;
use rocket::serde::json::Json;
use rocket::{get, post, State};

#[post("/v1/relay/send", format = "json", data = "<body>")]
pub fn relay_send(
    store: &State<Arc<Store>>,
    events: &State<Arc<EventBus>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    body: Json<SendMessage>,
) -> AppResult<Json<SendMessageResponse>> {
    let agent_id = super::authed(store, config, &key)?;
    Ok(Json(relay::send(store, events, &agent_id, body.into_inner())?))
}

#[get("/v1/relay/inbox?<channel>&<unread_only>")]
pub fn relay_inbox(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    channel: Option<&str>,
    unread_only: Option<bool>,
) -> AppResult<Json<InboxResponse>> {
    let agent_id = super::authed(store, config, &key)?;
    let messages = relay::inbox(store, &agent_id, channel, unread_only.unwrap_or(false))?;
    Ok(Json(InboxResponse { count: messages.len(), messages }))
}

#[post("/v1/relay/<message_id>/read")]
pub fn relay_mark_read(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    message_id: &str,
) -> AppResult<Json<serde_json::Value>> {
    let agent_id = super::authed(store, config, &key)?;
    relay::mark_read(store, &agent_id, message_id)?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}
