use crate::error::{AppError, AppResult};
use crate::events::{AgentEvent, EventBus};
use crate::models::{Job, SubmitJob};
use crate::store::{generate_id, Store};
use rusqlite::{params, OptionalExtension};

pub fn submit(store: &Store, agent_id: &str, body: SubmitJob) -> AppResult<String> {
    let job_id = generate_id("job");
    let now = chrono::Utc::now().to_rfc3339();
    store.conn().execute(
        "INSERT INTO jobs (job_id, agent_id, queue_name, payload, priority, status, attempts, max_attempts, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'pending', 0, ?6, ?7)",
        params![&job_id, agent_id, &body.queue_name, &body.payload, body.priority, body.max_attempts, &now],
    )?;
    Ok(job_id)
}

/// Atomic select+update under one transaction so two claimers can never take
/// the same row (spec.md §4.G). `queue_name` absent means any queue.
pub fn claim(store: &Store, claimer_agent_id: &str, queue_name: Option<&str>, visibility_timeout_secs: i64) -> AppResult<Option<Job>> {
    let mut conn = store.conn();
    let tx = conn.transaction()?;

    let job_id: Option<String> = tx
        .query_row(
            "SELECT job_id FROM jobs WHERE status = 'pending' AND (?1 IS NULL OR queue_name = ?1)
             ORDER BY priority DESC, created_at ASC LIMIT 1",
            params![queue_name],
            |r| r.get(0),
        )
        .optional()?;

    let Some(job_id) = job_id else {
        tx.commit()?;
        return Ok(None);
    };

    let now = chrono::Utc::now();
    let now_str = now.to_rfc3339();
    let deadline = (now + chrono::Duration::seconds(visibility_timeout_secs)).to_rfc3339();

    tx.execute(
        "UPDATE jobs SET status = 'claimed', claimed_by = ?1, claimed_at = ?2, visibility_deadline = ?3, attempts = attempts + 1
         WHERE job_id = ?4 AND status = 'pending'",
        params![claimer_agent_id, &now_str, &deadline, &job_id],
    )?;

    let job = tx.query_row(
        "SELECT job_id, agent_id, queue_name, payload, priority, status, attempts, max_attempts,
                claimed_by, claimed_at, completed_at, result, error, created_at, visibility_deadline
         FROM jobs WHERE job_id = ?1",
        params![&job_id],
        row_to_job,
    )?;
    tx.commit()?;
    Ok(Some(job))
}

pub fn complete(store: &Store, events: &EventBus, claimer_agent_id: &str, job_id: &str, result: Option<&str>) -> AppResult<()> {
    let conn = store.conn();
    let now = chrono::Utc::now().to_rfc3339();

    let row: Option<String> = conn
        .query_row(
            "SELECT agent_id FROM jobs WHERE job_id = ?1 AND status = 'claimed' AND claimed_by = ?2",
            params![job_id, claimer_agent_id],
            |r| r.get(0),
        )
        .optional()?;
    let Some(submitter) = row else {
        return Err(AppError::NotFound("job not found or not claimed by caller".to_string()));
    };

    conn.execute(
        "UPDATE jobs SET status = 'completed', result = ?1, completed_at = ?2 WHERE job_id = ?3",
        params![result, &now, job_id],
    )?;
    drop(conn);

    events.publish(AgentEvent::JobCompleted { agent_id: submitter, job_id: job_id.to_string(), result: result.map(String::from) });
    Ok(())
}

pub fn fail(store: &Store, events: &EventBus, claimer_agent_id: &str, job_id: &str, reason: Option<&str>) -> AppResult<()> {
    let conn = store.conn();
    let row: Option<(String, i64, i64)> = conn
        .query_row(
            "SELECT agent_id, attempts, max_attempts FROM jobs WHERE job_id = ?1 AND status = 'claimed' AND claimed_by = ?2",
            params![job_id, claimer_agent_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let Some((submitter, attempts, max_attempts)) = row else {
        return Err(AppError::NotFound("job not found or not claimed by caller".to_string()));
    };

    let dead = attempts >= max_attempts;
    apply_failure(&conn, job_id, reason.unwrap_or(""), dead)?;
    drop(conn);

    events.publish(AgentEvent::JobFailed { agent_id: submitter, job_id: job_id.to_string(), error: reason.map(String::from), dead });
    Ok(())
}

fn apply_failure(conn: &rusqlite::Connection, job_id: &str, error: &str, dead: bool) -> rusqlite::Result<()> {
    if dead {
        conn.execute("UPDATE jobs SET status = 'dead', error = ?1 WHERE job_id = ?2", params![error, job_id])?;
    } else {
        conn.execute(
            "UPDATE jobs SET status = 'pending', error = ?1, claimed_by = NULL, claimed_at = NULL, visibility_deadline = NULL WHERE job_id = ?2",
            params![error, job_id],
        )?;
    }
    Ok(())
}

pub fn list(store: &Store, agent_id: &str, queue_name: Option<&str>, status: Option<&str>) -> AppResult<Vec<Job>> {
    let conn = store.conn();
    let mut stmt = conn.prepare(
        "SELECT job_id, agent_id, queue_name, payload, priority, status, attempts, max_attempts,
                claimed_by, claimed_at, completed_at, result, error, created_at, visibility_deadline
         FROM jobs WHERE agent_id = ?1 AND (?2 IS NULL OR queue_name = ?2) AND (?3 IS NULL OR status = ?3)
         ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![agent_id, queue_name, status], row_to_job)?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}

pub fn get(store: &Store, agent_id: &str, job_id: &str) -> AppResult<Job> {
    let conn = store.conn();
    conn.query_row(
        "SELECT job_id, agent_id, queue_name, payload, priority, status, attempts, max_attempts,
                claimed_by, claimed_at, completed_at, result, error, created_at, visibility_deadline
         FROM jobs WHERE job_id = ?1 AND agent_id = ?2",
        params![job_id, agent_id],
        row_to_job,
    )
    .map_err(|_| AppError::NotFound("job not found".to_string()))
}

pub fn dead_letter(store: &Store, agent_id: &str, queue_name: Option<&str>) -> AppResult<Vec<Job>> {
    list(store, agent_id, queue_name, Some("dead"))
}

pub fn replay(store: &Store, agent_id: &str, job_id: &str) -> AppResult<()> {
    let conn = store.conn();
    let changed = conn.execute(
        "UPDATE jobs SET status = 'pending', attempts = 0, claimed_by = NULL, claimed_at = NULL,
                visibility_deadline = NULL, error = NULL
         WHERE job_id = ?1 AND agent_id = ?2 AND status = 'dead'",
        params![job_id, agent_id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound("dead job not found".to_string()));
    }
    Ok(())
}

/// Reclaims jobs whose visibility deadline passed without completion, by the
/// same retry/dead-letter rule as `fail` (spec.md §4.G). Run on every
/// scheduler tick. Returns the number of jobs swept.
pub fn sweep_visibility_timeouts(store: &Store, events: &EventBus) -> AppResult<usize> {
    let conn = store.conn();
    let now = chrono::Utc::now().to_rfc3339();

    let mut stmt = conn.prepare(
        "SELECT job_id, agent_id, attempts, max_attempts FROM jobs
         WHERE status = 'claimed' AND visibility_deadline IS NOT NULL AND visibility_deadline <= ?1",
    )?;
    let expired: Vec<(String, String, i64, i64)> = stmt
        .query_map(params![now], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?
        .filter_map(|r| r.ok())
        .collect();
    drop(stmt);

    let count = expired.len();
    for (job_id, submitter, attempts, max_attempts) in expired {
        let dead = attempts >= max_attempts;
        apply_failure(&conn, &job_id, "visibility timeout", dead)?;
        events.publish(AgentEvent::JobFailed { agent_id: submitter, job_id, error: Some("visibility timeout".to_string()), dead });
    }
    Ok(count)
}

fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
    Ok(Job {
        job_id: row.get(0)?,
        agent_id: row.get(1)?,
        queue_name: row.get(2)?,
        payload: row.get(3)?,
        priority: row.get(4)?,
        status: row.get(5)?,
        attempts: row.get(6)?,
        max_attempts: row.get(7)?,
        claimed_by: row.get(8)?,
        claimed_at: row.get(9)?,
        completed_at: row.get(10)?,
        result: row.get(11)?,
        error: row.get(12)?,
        created_at: row.get(13)?,
        visibility_deadline: row.get(14)?,
    })
}
