use std::sync::Arc;
use crate::config::Config;
use crate::error::AppResult;
use crate::identity::ApiKeyHeader;
use crate::models::{CreateSchedule, ScheduleListResponse, ScheduledTask, ToggleSchedule};
use crate::scheduler;
use crate::store::Store;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, State};

#[post("/v1/schedules", format = "json", data = "<body>")]
pub fn schedule_create(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    body: Json<CreateSchedule>,
) -> AppResult<Json<ScheduledTask>> {
    let agent_id = super::authed(store, config, &key)?;
    Ok(Json(scheduler::create(store, &agent_id, body.into_inner())?))
}

#[get("/v1/schedules")]
pub fn schedule_list(store: &State<Arc<Store>>, config: &State<Config>, key: ApiKeyHeader) -> AppResult<Json<ScheduleListResponse>> {
    let agent_id = super::authed(store, config, &key)?;
    let schedules = scheduler::list(store, &agent_id)?;
    Ok(Json(ScheduleListResponse { count: schedules.len(), schedules }))
}

#[get("/v1/schedules/<task_id>")]
pub fn schedule_get(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    task_id: &str,
) -> AppResult<Json<ScheduledTask>> {
    let agent_id = super::authed(store, config, &key)?;
    Ok(Json(scheduler::get(store, &agent_id, task_id)?))
}

#[put("/v1/schedules/<task_id>", format = "json", data = "<body>")]
pub fn schedule_toggle(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    task_id: &str,
    body: Json<ToggleSchedule>,
) -> AppResult<Json<serde_json::Value>> {
    let agent_id = super::authed(store, config, &key)?;
    scheduler::toggle(store, &agent_id, task_id, body.enabled)?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}

#[delete("/v1/schedules/<task_id>")]
pub fn schedule_delete(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    task_id: &str,
) -> AppResult<Json<serde_json::Value>> {
    let agent_id = super::authed(store, config, &key)?;
    scheduler::delete(store, &agent_id, task_id)?;
    Ok(Json(serde_json::json!({"status": "deleted"})))
}
