use crate::error::{AppError, AppResult};
use crate::models::MemoryEntry;
use crate::store::Store;
use rusqlite::{params, OptionalExtension};

const DEFAULT_NAMESPACE: &str = "default";
const MIN_TTL_SECS: i64 = 60;

fn ns(namespace: Option<&str>) -> &str {
    namespace.unwrap_or(DEFAULT_NAMESPACE)
}

pub fn set(
    store: &Store,
    agent_id: &str,
    key: &str,
    value: &str,
    namespace: Option<&str>,
    ttl_seconds: Option<i64>,
) -> AppResult<MemoryEntry> {
    if let Some(ttl) = ttl_seconds
        && ttl < MIN_TTL_SECS
    {
        return Err(AppError::BadRequest(format!("ttl_seconds must be >= {MIN_TTL_SECS}")));
    }

    let namespace = ns(namespace);
    let now = chrono::Utc::now();
    let now_str = now.to_rfc3339();
    let expires_at = ttl_seconds.map(|t| (now + chrono::Duration::seconds(t)).to_rfc3339());

    let conn = store.conn();
    let created_at: Option<String> = conn
        .query_row(
            "SELECT created_at FROM memory_entries WHERE agent_id = ?1 AND namespace = ?2 AND key = ?3",
            params![agent_id, namespace, key],
            |r| r.get(0),
        )
        .optional()?;
    let created_at = created_at.unwrap_or_else(|| now_str.clone());

    conn.execute(
        "INSERT INTO memory_entries (agent_id, namespace, key, value, created_at, updated_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(agent_id, namespace, key) DO UPDATE SET value = ?4, updated_at = ?6, expires_at = ?7",
        params![agent_id, namespace, key, value, &created_at, &now_str, &expires_at],
    )?;

    Ok(MemoryEntry {
        key: key.to_string(),
        namespace: namespace.to_string(),
        value: value.to_string(),
        created_at,
        updated_at: now_str,
        expires_at,
    })
}

pub fn get(store: &Store, agent_id: &str, key: &str, namespace: Option<&str>) -> AppResult<MemoryEntry> {
    let namespace = ns(namespace);
    let now = chrono::Utc::now().to_rfc3339();
    let conn = store.conn();
    conn.query_row(
        "SELECT key, namespace, value, created_at, updated_at, expires_at FROM memory_entries
         WHERE agent_id = ?1 AND namespace = ?2 AND key = ?3 AND (expires_at IS NULL OR expires_at > ?4)",
        params![agent_id, namespace, key, now],
        row_to_entry,
    )
    .map_err(|_| AppError::NotFound("key not found".to_string()))
}

pub fn list(store: &Store, agent_id: &str, namespace: Option<&str>, prefix: Option<&str>) -> AppResult<Vec<MemoryEntry>> {
    let namespace = ns(namespace);
    let now = chrono::Utc::now().to_rfc3339();
    let conn = store.conn();
    let prefix_pattern = prefix.map(|p| format!("{}%", p.replace('%', "\\%")));

    let mut stmt = conn.prepare(
        "SELECT key, namespace, value, created_at, updated_at, expires_at FROM memory_entries
         WHERE agent_id = ?1 AND namespace = ?2 AND (expires_at IS NULL OR expires_at > ?3)
         AND (?4 IS NULL OR key LIKE ?4 ESCAPE '\\')
         ORDER BY key ASC",
    )?;
    let rows = stmt
        .query_map(params![agent_id, namespace, now, prefix_pattern], row_to_entry)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(rows)
}

pub fn delete(store: &Store, agent_id: &str, key: &str, namespace: Option<&str>) -> AppResult<()> {
    let namespace = ns(namespace);
    let now = chrono::Utc::now().to_rfc3339();
    let conn = store.conn();
    let changed = conn.execute(
        "DELETE FROM memory_entries WHERE agent_id = ?1 AND namespace = ?2 AND key = ?3 AND (expires_at IS NULL OR expires_at > ?4)",
        params![agent_id, namespace, key, now],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound("key not found".to_string()));
    }
    Ok(())
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<MemoryEntry> {
    Ok(MemoryEntry {
        key: row.get(0)?,
        namespace: row.get(1)?,
        value: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        expires_at: row.get(5)?,
    })
}
