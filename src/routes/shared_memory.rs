use std::sync::Arc;
use crate::config::Config;
use crate::error::AppResult;
use crate::identity::ApiKeyHeader;
use crate::models::{MemoryListResponse, NamespacesResponse, SharedMemoryEntry};
use crate::shared_memory;
use crate::store::Store;
use rocket::serde::json::Json;
use rocket::{delete, get, post, State};

#[derive(Debug, serde::Deserialize)]
pub struct SetSharedMemory {
    pub value: String,
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[post("/v1/shared-memory/<namespace>/<key_name>", format = "json", data = "<body>")]
pub fn shared_memory_set(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    namespace: &str,
    key_name: &str,
    body: Json<SetSharedMemory>,
) -> AppResult<Json<SharedMemoryEntry>> {
    let agent_id = super::authed(store, config, &key)?;
    let body = body.into_inner();
    Ok(Json(shared_memory::set(
        store,
        &agent_id,
        namespace,
        key_name,
        &body.value,
        body.ttl_seconds,
        body.description.as_deref(),
    )?))
}

#[get("/v1/shared-memory/<namespace>/<key_name>")]
pub fn shared_memory_get(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    namespace: &str,
    key_name: &str,
) -> AppResult<Json<SharedMemoryEntry>> {
    super::authed(store, config, &key)?;
    Ok(Json(shared_memory::get(store, namespace, key_name)?))
}

#[get("/v1/shared-memory/<namespace>?<prefix>")]
pub fn shared_memory_list(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    namespace: &str,
    prefix: Option<&str>,
) -> AppResult<Json<MemoryListResponse<SharedMemoryEntry>>> {
    super::authed(store, config, &key)?;
    let entries = shared_memory::list(store, namespace, prefix)?;
    Ok(Json(MemoryListResponse { count: entries.len(), entries }))
}

#[get("/v1/shared-memory")]
pub fn shared_memory_namespaces(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
) -> AppResult<Json<NamespacesResponse>> {
    super::authed(store, config, &key)?;
    let namespaces = shared_memory::list_namespaces(store)?;
    Ok(Json(NamespacesResponse { count: namespaces.len(), namespaces }))
}

#[delete("/v1/shared-memory/<namespace>/<key_name>")]
pub fn shared_memory_delete(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    namespace: &str,
    key_name: &str,
) -> AppResult<Json<serde_json::Value>> {
    let agent_id = super::authed(store, config, &key)?;
    shared_memory::delete(store, &agent_id, namespace, key_name)?;
    Ok(Json(serde_json::json!({"status": "deleted"})))
}
