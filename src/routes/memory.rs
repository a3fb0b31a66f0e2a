use std::sync::Arc;
use crate::config::Config;
use crate::error::AppResult;
use crate::identity::ApiKeyHeader;
use crate::memory;
use crate::models::{MemoryEntry, MemoryListResponse, SetMemory};
use crate::store::Store;
use rocket::serde::json::Json;
use rocket::{delete, get, post, State};

#[post("/v1/memory", format = "json", data = "<body>")]
pub fn memory_set(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    body: Json<SetMemory>,
) -> AppResult<Json<MemoryEntry>> {
    let agent_id = super::authed(store, config, &key)?;
    let body = body.into_inner();
    Ok(Json(memory::set(
        store,
        &agent_id,
        &body.key,
        &body.value,
        body.namespace.as_deref(),
        body.ttl_seconds,
    )?))
}

#[get("/v1/memory/<key_name>?<namespace>")]
pub fn memory_get(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    key_name: &str,
    namespace: Option<&str>,
) -> AppResult<Json<MemoryEntry>> {
    let agent_id = super::authed(store, config, &key)?;
    Ok(Json(memory::get(store, &agent_id, key_name, namespace)?))
}

#[get("/v1/memory?<namespace>&<prefix>")]
pub fn memory_list(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    namespace: Option<&str>,
    prefix: Option<&str>,
) -> AppResult<Json<MemoryListResponse<MemoryEntry>>> {
    let agent_id = super::authed(store, config, &key)?;
    let entries = memory::list(store, &agent_id, namespace, prefix)?;
    Ok(Json(MemoryListResponse { count: entries.len(), entries }))
}

#[delete("/v1/memory/<key_name>?<namespace>")]
pub fn memory_delete(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    key_name: &str,
    namespace: Option<&str>,
) -> AppResult<Json<serde_json::Value>> {
    let agent_id = super::authed(store, config, &key)?;
    memory::delete(store, &agent_id, key_name, namespace)?;
    Ok(Json(serde_json::json!({"status": "deleted"})))
}
