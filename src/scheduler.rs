use crate::error::{AppError, AppResult};
use crate::events::EventBus;
use crate::models::{CreateSchedule, SubmitJob};
use crate::queue;
use crate::store::{generate_id, Store};
use rusqlite::params;
use std::str::FromStr;
use std::sync::Arc;

use crate::models::ScheduledTask;

/// Accepts standard 5-field cron (`minute hour dom month dow`, spec.md §4.H)
/// by prepending a seconds field the `cron` crate requires but this
/// system's wire format doesn't expose.
fn compute_next_run(cron_expr: &str) -> AppResult<chrono::DateTime<chrono::Utc>> {
    let with_seconds = format!("0 {cron_expr}");
    let schedule = cron::Schedule::from_str(&with_seconds)
        .map_err(|e| AppError::BadRequest(format!("invalid cron expression: {e}")))?;
    schedule
        .upcoming(chrono::Utc)
        .next()
        .ok_or_else(|| AppError::BadRequest("cron expression has no future occurrence".to_string()))
}

pub fn create(store: &Store, agent_id: &str, body: CreateSchedule) -> AppResult<ScheduledTask> {
    let next_run_at = compute_next_run(&body.cron_expr)?;
    let task_id = generate_id("sched");
    let now = chrono::Utc::now().to_rfc3339();
    let next_run_str = next_run_at.to_rfc3339();

    store.conn().execute(
        "INSERT INTO scheduled_tasks (task_id, agent_id, cron_expr, payload, queue_name, priority, max_attempts, enabled, next_run_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9)",
        params![&task_id, agent_id, &body.cron_expr, &body.payload, &body.queue_name, body.priority, body.max_attempts, &next_run_str, &now],
    )?;

    get(store, agent_id, &task_id)
}

pub fn get(store: &Store, agent_id: &str, task_id: &str) -> AppResult<ScheduledTask> {
    let conn = store.conn();
    conn.query_row(
        "SELECT task_id, agent_id, cron_expr, payload, queue_name, priority, max_attempts, enabled, next_run_at, last_run_at, created_at
         FROM scheduled_tasks WHERE task_id = ?1 AND agent_id = ?2",
        params![task_id, agent_id],
        row_to_task,
    )
    .map_err(|_| AppError::NotFound("schedule not found".to_string()))
}

pub fn list(store: &Store, agent_id: &str) -> AppResult<Vec<ScheduledTask>> {
    let conn = store.conn();
    let mut stmt = conn.prepare(
        "SELECT task_id, agent_id, cron_expr, payload, queue_name, priority, max_attempts, enabled, next_run_at, last_run_at, created_at
         FROM scheduled_tasks WHERE agent_id = ?1 ORDER BY created_at ASC",
    )?;
    let rows = stmt.query_map(params![agent_id], row_to_task)?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}

pub fn toggle(store: &Store, agent_id: &str, task_id: &str, enabled: bool) -> AppResult<()> {
    let conn = store.conn();
    let changed = conn.execute(
        "UPDATE scheduled_tasks SET enabled = ?1 WHERE task_id = ?2 AND agent_id = ?3",
        params![enabled, task_id, agent_id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound("schedule not found".to_string()));
    }
    Ok(())
}

pub fn delete(store: &Store, agent_id: &str, task_id: &str) -> AppResult<()> {
    let conn = store.conn();
    let changed = conn.execute("DELETE FROM scheduled_tasks WHERE task_id = ?1 AND agent_id = ?2", params![task_id, agent_id])?;
    if changed == 0 {
        return Err(AppError::NotFound("schedule not found".to_string()));
    }
    Ok(())
}

/// Runs one scheduler tick: enqueues all due tasks, recomputes their next
/// occurrence, then runs the job visibility-timeout sweep (spec.md §4.H).
/// Idempotent within the same second — a task only fires if `next_run_at`
/// has not already been advanced past `now`.
pub fn run_tick(store: &Store, events: &EventBus) {
    if let Err(e) = run_due_tasks(store) {
        tracing::error!(error = %e, "scheduler tick: due-task sweep failed");
    }
    match queue::sweep_visibility_timeouts(store, events) {
        Ok(n) if n > 0 => tracing::info!(reclaimed = n, "scheduler tick: reclaimed expired job claims"),
        Err(e) => tracing::error!(error = %e, "scheduler tick: visibility sweep failed"),
        _ => {}
    }
}

fn run_due_tasks(store: &Store) -> AppResult<()> {
    let now = chrono::Utc::now();
    let now_str = now.to_rfc3339();

    let due: Vec<(String, String, String, String, i64, i64)> = {
        let conn = store.conn();
        let mut stmt = conn.prepare(
            "SELECT task_id, agent_id, payload, queue_name, priority, max_attempts FROM scheduled_tasks
             WHERE enabled = 1 AND next_run_at <= ?1",
        )?;
        stmt.query_map(params![now_str], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
        })?
        .filter_map(|r| r.ok())
        .collect()
    };

    for (task_id, agent_id, payload, queue_name, priority, max_attempts) in due {
        let cron_expr: String = store.conn().query_row(
            "SELECT cron_expr FROM scheduled_tasks WHERE task_id = ?1",
            params![&task_id],
            |r| r.get(0),
        )?;
        let next_run_at = match compute_next_run(&cron_expr) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(task_id, error = %e, "scheduler tick: could not recompute next_run_at");
                continue;
            }
        };

        queue::submit(
            store,
            &agent_id,
            SubmitJob { payload, queue_name, priority, max_attempts },
        )?;

        store.conn().execute(
            "UPDATE scheduled_tasks SET last_run_at = ?1, next_run_at = ?2 WHERE task_id = ?3",
            params![&now_str, next_run_at.to_rfc3339(), &task_id],
        )?;
    }

    Ok(())
}

/// Spawns the background ticker, mirroring the teacher's retention-task
/// spawn/pure-function split: the loop owns timing, `run_tick` is the
/// separately testable unit of work.
pub fn spawn_scheduler_task(store: Arc<Store>, events: Arc<EventBus>, tick_secs: u64) {
    tokio::spawn(async move {
        loop {
            run_tick(&store, &events);
            tokio::time::sleep(std::time::Duration::from_secs(tick_secs)).await;
        }
    });
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<ScheduledTask> {
    Ok(ScheduledTask {
        task_id: row.get(0)?,
        agent_id: row.get(1)?,
        cron_expr: row.get(2)?,
        payload: row.get(3)?,
        queue_name: row.get(4)?,
        priority: row.get(5)?,
        max_attempts: row.get(6)?,
        enabled: row.get::<_, i64>(7)? != 0,
        next_run_at: row.get(8)?,
        last_run_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_standard_five_field_cron() {
        assert!(compute_next_run("0 0 * * *").is_ok());
        assert!(compute_next_run("*/5 * * * *").is_ok());
        assert!(compute_next_run("* * * * *").is_ok());
    }

    #[test]
    fn rejects_malformed_expression() {
        let err = compute_next_run("not a cron").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
