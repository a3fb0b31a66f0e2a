use crate::error::{AppError, AppResult};
use crate::models::{AgentProfile, Heartbeat, RegisterAgent, RegisterResponse};
use crate::store::{generate_api_key, generate_id, hash_api_key, Store};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rusqlite::{params, OptionalExtension};

/// Request guard that extracts the presented API key from the `X-API-Key`
/// header without validating it — validation happens in `authenticate`
/// against the `Store`, the same split the teacher uses between its
/// `AdminKey` guard (header extraction) and the route body (DB lookup).
pub struct ApiKeyHeader(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ApiKeyHeader {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.headers().get_one("X-API-Key") {
            Some(key) => Outcome::Success(ApiKeyHeader(key.to_string())),
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}

/// Authenticates the presented key and applies the per-agent fixed-window
/// rate limiter in one Store transaction. Returns the caller's `agent_id`.
pub fn authenticate(store: &Store, rate_limit_per_minute: usize, presented_key: &str) -> AppResult<String> {
    let conn = store.conn();
    let hash = hash_api_key(presented_key);

    let agent_id: Option<String> = conn
        .query_row("SELECT agent_id FROM agents WHERE api_key_hash = ?1", params![hash], |r| r.get(0))
        .optional()?;
    let agent_id = agent_id.ok_or(AppError::Unauthorized)?;

    check_rate_limit(&conn, &agent_id, rate_limit_per_minute)?;

    Ok(agent_id)
}

/// Fixed-window counter keyed by `(agent_id, floor(now/60s))`, persisted in
/// `rate_windows` per spec.md §3/§4.B. Sweeps stale windows lazily.
fn check_rate_limit(conn: &rusqlite::Connection, agent_id: &str, max_per_minute: usize) -> AppResult<()> {
    let window = chrono::Utc::now().timestamp() / 60;

    conn.execute(
        "DELETE FROM rate_windows WHERE agent_id = ?1 AND window_start < ?2",
        params![agent_id, window],
    )?;

    let count: i64 = conn
        .query_row(
            "SELECT count FROM rate_windows WHERE agent_id = ?1 AND window_start = ?2",
            params![agent_id, window],
            |r| r.get(0),
        )
        .optional()?
        .unwrap_or(0);

    if count as usize >= max_per_minute {
        let retry_after_secs = (60 - (chrono::Utc::now().timestamp() % 60)) as u64;
        return Err(AppError::RateLimited { retry_after_secs, limit: max_per_minute });
    }

    conn.execute(
        "INSERT INTO rate_windows (agent_id, window_start, count) VALUES (?1, ?2, 1)
         ON CONFLICT(agent_id, window_start) DO UPDATE SET count = count + 1",
        params![agent_id, window],
    )?;

    Ok(())
}

pub fn register(store: &Store, body: RegisterAgent) -> AppResult<RegisterResponse> {
    let agent_id = generate_id("agent");
    let api_key = generate_api_key();
    let hash = hash_api_key(&api_key);
    let name = body.name.unwrap_or_else(|| "unnamed-agent".to_string());
    let description = body.description.unwrap_or_default();
    let now = chrono::Utc::now().to_rfc3339();

    store.conn().execute(
        "INSERT INTO agents (agent_id, name, api_key_hash, created_at, status, description) VALUES (?1, ?2, ?3, ?4, 'active', ?5)",
        params![&agent_id, &name, &hash, &now, &description],
    )?;

    Ok(RegisterResponse {
        agent_id,
        api_key,
        message: "Store your API key now — it cannot be retrieved again.".to_string(),
    })
}

pub fn heartbeat(store: &Store, agent_id: &str, body: Heartbeat) -> AppResult<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let conn = store.conn();

    if let Some(status) = &body.status {
        conn.execute(
            "UPDATE agents SET last_heartbeat = ?1, status = ?2 WHERE agent_id = ?3",
            params![&now, status, agent_id],
        )?;
    } else {
        conn.execute(
            "UPDATE agents SET last_heartbeat = ?1 WHERE agent_id = ?2",
            params![&now, agent_id],
        )?;
    }

    if let Some(metadata) = &body.metadata {
        conn.execute(
            "UPDATE agents SET metadata = ?1 WHERE agent_id = ?2",
            params![serde_json::to_string(metadata).unwrap_or_default(), agent_id],
        )?;
    }

    Ok(())
}

pub fn get_profile(store: &Store, agent_id: &str) -> AppResult<AgentProfile> {
    let conn = store.conn();
    conn.query_row(
        "SELECT agent_id, name, created_at, last_heartbeat, status, metadata, description, capabilities, public
         FROM agents WHERE agent_id = ?1",
        params![agent_id],
        row_to_profile,
    )
    .map_err(|_| AppError::NotFound("agent not found".to_string()))
}

pub(crate) fn row_to_profile(row: &rusqlite::Row) -> rusqlite::Result<AgentProfile> {
    let metadata_str: String = row.get(5)?;
    let capabilities_str: String = row.get(7)?;
    Ok(AgentProfile {
        agent_id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        last_heartbeat: row.get(3)?,
        status: row.get(4)?,
        metadata: serde_json::from_str(&metadata_str).unwrap_or(serde_json::json!({})),
        description: row.get(6)?,
        capabilities: serde_json::from_str(&capabilities_str).unwrap_or_default(),
        public: row.get::<_, i64>(8)? != 0,
    })
}

#[derive(Debug, serde::Serialize)]
pub struct AgentStats {
    pub agent_id: String,
    pub memory_keys: i64,
    pub shared_memory_keys: i64,
    pub jobs_submitted: i64,
    pub jobs_pending: i64,
    pub unread_messages: i64,
    pub active_webhooks: i64,
    pub active_schedules: i64,
}

pub fn stats(store: &Store, agent_id: &str) -> AppResult<AgentStats> {
    let conn = store.conn();
    let memory_keys: i64 = conn.query_row(
        "SELECT COUNT(*) FROM memory_entries WHERE agent_id = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
        params![agent_id, chrono::Utc::now().to_rfc3339()],
        |r| r.get(0),
    )?;
    let shared_memory_keys: i64 = conn.query_row(
        "SELECT COUNT(*) FROM shared_memory_entries WHERE owner_agent_id = ?1",
        params![agent_id],
        |r| r.get(0),
    )?;
    let jobs_submitted: i64 =
        conn.query_row("SELECT COUNT(*) FROM jobs WHERE agent_id = ?1", params![agent_id], |r| r.get(0))?;
    let jobs_pending: i64 = conn.query_row(
        "SELECT COUNT(*) FROM jobs WHERE agent_id = ?1 AND status = 'pending'",
        params![agent_id],
        |r| r.get(0),
    )?;
    let unread_messages: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE to_agent = ?1 AND read_at IS NULL",
        params![agent_id],
        |r| r.get(0),
    )?;
    let active_webhooks: i64 = conn.query_row(
        "SELECT COUNT(*) FROM webhooks WHERE agent_id = ?1 AND active = 1",
        params![agent_id],
        |r| r.get(0),
    )?;
    let active_schedules: i64 = conn.query_row(
        "SELECT COUNT(*) FROM scheduled_tasks WHERE agent_id = ?1 AND enabled = 1",
        params![agent_id],
        |r| r.get(0),
    )?;

    Ok(AgentStats {
        agent_id: agent_id.to_string(),
        memory_keys,
        shared_memory_keys,
        jobs_submitted,
        jobs_pending,
        unread_messages,
        active_webhooks,
        active_schedules,
    })
}
