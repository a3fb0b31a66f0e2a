use std::sync::Arc;
use crate::config::Config;
use crate::error::AppResult;
use crate::events::EventBus;
use crate::identity::ApiKeyHeader;
use crate::models::{ClaimResponse, CompleteJob, FailJob, Job, JobListResponse, SubmitJob, SubmitJobResponse};
use crate::queue;
use crate::store::Store;
use rocket::serde::json::Json;
use rocket::{get, post, State};

#[post("/v1/queue/submit", format = "json", data = "<body>")]
pub fn queue_submit(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    body: Json<SubmitJob>,
) -> AppResult<Json<SubmitJobResponse>> {
    let agent_id = super::authed(store, config, &key)?;
    let job_id = queue::submit(store, &agent_id, body.into_inner())?;
    Ok(Json(SubmitJobResponse { job_id }))
}

#[post("/v1/queue/claim?<queue_name>")]
pub fn queue_claim(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    queue_name: Option<&str>,
) -> AppResult<Json<ClaimResponse>> {
    let agent_id = super::authed(store, config, &key)?;
    let claimed = queue::claim(store, &agent_id, queue_name, config.visibility_timeout_secs)?;
    Ok(Json(match claimed {
        Some(job) => ClaimResponse::Job(job),
        None => ClaimResponse::Empty { status: "empty" },
    }))
}

#[post("/v1/queue/<job_id>/complete", format = "json", data = "<body>")]
pub fn queue_complete(
    store: &State<Arc<Store>>,
    events: &State<Arc<EventBus>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    job_id: &str,
    body: Json<CompleteJob>,
) -> AppResult<Json<serde_json::Value>> {
    let agent_id = super::authed(store, config, &key)?;
    queue::complete(store, events, &agent_id, job_id, body.result.as_deref())?;
    Ok(Json(serde_json::json!({"status": "completed"})))
}

#[post("/v1/queue/<job_id>/fail", format = "json", data = "<body>")]
pub fn queue_fail(
    store: &State<Arc<Store>>,
    events: &State<Arc<EventBus>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    job_id: &str,
    body: Json<FailJob>,
) -> AppResult<Json<serde_json::Value>> {
    let agent_id = super::authed(store, config, &key)?;
    queue::fail(store, events, &agent_id, job_id, body.reason.as_deref())?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}

#[get("/v1/queue?<queue_name>&<status>")]
pub fn queue_list(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    queue_name: Option<&str>,
    status: Option<&str>,
) -> AppResult<Json<JobListResponse>> {
    let agent_id = super::authed(store, config, &key)?;
    let jobs = queue::list(store, &agent_id, queue_name, status)?;
    Ok(Json(JobListResponse { count: jobs.len(), jobs }))
}

#[get("/v1/queue/<job_id>")]
pub fn queue_get(store: &State<Arc<Store>>, config: &State<Config>, key: ApiKeyHeader, job_id: &str) -> AppResult<Json<Job>> {
    let agent_id = super::authed(store, config, &key)?;
    Ok(Json(queue::get(store, &agent_id, job_id)?))
}

#[get("/v1/queue/dead-letter?<queue_name>")]
pub fn queue_dead_letter(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    queue_name: Option<&str>,
) -> AppResult<Json<JobListResponse>> {
    let agent_id = super::authed(store, config, &key)?;
    let jobs = queue::dead_letter(store, &agent_id, queue_name)?;
    Ok(Json(JobListResponse { count: jobs.len(), jobs }))
}

#[post("/v1/queue/<job_id>/replay")]
pub fn queue_replay(
    store: &State<Arc<Store>>,
    config: &State<Config>,
    key: ApiKeyHeader,
    job_id: &str,
) -> AppResult<Json<serde_json::Value>> {
    let agent_id = super::authed(store, config, &key)?;
    queue::replay(store, &agent_id, job_id)?;
    Ok(Json(serde_json::json!({"status": "pending"})))
}
