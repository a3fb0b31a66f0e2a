use std::sync::Arc;
use crate::models::{HealthResponse, SystemStats};
use crate::push::PushHub;
use crate::store::Store;
use rocket::serde::json::Json;
use rocket::{get, State};

#[get("/v1/health")]
pub fn health(store: &State<Arc<Store>>, hub: &State<PushHub>) -> Json<HealthResponse> {
    let conn = store.conn();
    let active_webhooks: i64 =
        conn.query_row("SELECT COUNT(*) FROM webhooks WHERE active = 1", [], |r| r.get(0)).unwrap_or(0);
    let active_schedules: i64 =
        conn.query_row("SELECT COUNT(*) FROM scheduled_tasks WHERE enabled = 1", [], |r| r.get(0)).unwrap_or(0);

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        stats: SystemStats { active_webhooks, active_schedules, websocket_connections: hub.connection_count() },
    })
}

#[rocket::catch(429)]
pub fn too_many_requests() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "rate limited"}))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "not found"}))
}
