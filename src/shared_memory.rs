use crate::error::{AppError, AppResult};
use crate::models::SharedMemoryEntry;
use crate::store::Store;
use rusqlite::{params, OptionalExtension};

const MIN_TTL_SECS: i64 = 60;

pub fn set(
    store: &Store,
    owner_agent_id: &str,
    namespace: &str,
    key: &str,
    value: &str,
    ttl_seconds: Option<i64>,
    description: Option<&str>,
) -> AppResult<SharedMemoryEntry> {
    if let Some(ttl) = ttl_seconds
        && ttl < MIN_TTL_SECS
    {
        return Err(AppError::BadRequest(format!("ttl_seconds must be >= {MIN_TTL_SECS}")));
    }

    let now = chrono::Utc::now();
    let now_str = now.to_rfc3339();
    let expires_at = ttl_seconds.map(|t| (now + chrono::Duration::seconds(t)).to_rfc3339());

    let conn = store.conn();
    let existing: Option<(String, String)> = conn
        .query_row(
            "SELECT created_at, owner_agent_id FROM shared_memory_entries WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;

    // Update keeps the original owner regardless of who calls set (spec.md §4.D).
    let (created_at, owner) = match existing {
        Some((created_at, owner)) => (created_at, owner),
        None => (now_str.clone(), owner_agent_id.to_string()),
    };

    conn.execute(
        "INSERT INTO shared_memory_entries (namespace, key, value, owner_agent_id, created_at, updated_at, expires_at, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(namespace, key) DO UPDATE SET value = ?3, updated_at = ?6, expires_at = ?7, description = ?8",
        params![namespace, key, value, &owner, &created_at, &now_str, &expires_at, description],
    )?;

    Ok(SharedMemoryEntry {
        key: key.to_string(),
        namespace: namespace.to_string(),
        value: value.to_string(),
        owner_agent_id: owner,
        created_at,
        updated_at: now_str,
        expires_at,
        description: description.map(String::from),
    })
}

pub fn get(store: &Store, namespace: &str, key: &str) -> AppResult<SharedMemoryEntry> {
    let now = chrono::Utc::now().to_rfc3339();
    let conn = store.conn();
    conn.query_row(
        "SELECT key, namespace, value, owner_agent_id, created_at, updated_at, expires_at, description
         FROM shared_memory_entries WHERE namespace = ?1 AND key = ?2 AND (expires_at IS NULL OR expires_at > ?3)",
        params![namespace, key, now],
        row_to_entry,
    )
    .map_err(|_| AppError::NotFound("key not found".to_string()))
}

pub fn list(store: &Store, namespace: &str, prefix: Option<&str>) -> AppResult<Vec<SharedMemoryEntry>> {
    let now = chrono::Utc::now().to_rfc3339();
    let conn = store.conn();
    let prefix_pattern = prefix.map(|p| format!("{}%", p.replace('%', "\\%")));

    let mut stmt = conn.prepare(
        "SELECT key, namespace, value, owner_agent_id, created_at, updated_at, expires_at, description
         FROM shared_memory_entries
         WHERE namespace = ?1 AND (expires_at IS NULL OR expires_at > ?2)
         AND (?3 IS NULL OR key LIKE ?3 ESCAPE '\\')
         ORDER BY key ASC",
    )?;
    let rows = stmt
        .query_map(params![namespace, now, prefix_pattern], row_to_entry)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(rows)
}

/// Distinct namespaces currently containing at least one non-expired key.
pub fn list_namespaces(store: &Store) -> AppResult<Vec<String>> {
    let now = chrono::Utc::now().to_rfc3339();
    let conn = store.conn();
    let mut stmt = conn.prepare(
        "SELECT DISTINCT namespace FROM shared_memory_entries WHERE (expires_at IS NULL OR expires_at > ?1) ORDER BY namespace ASC",
    )?;
    let rows = stmt.query_map(params![now], |r| r.get(0))?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}

/// Deletes only succeed for the owning agent; non-owner and absent both
/// surface as `NotFound` to avoid leaking existence (spec.md §4.D).
pub fn delete(store: &Store, caller_agent_id: &str, namespace: &str, key: &str) -> AppResult<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let conn = store.conn();
    let changed = conn.execute(
        "DELETE FROM shared_memory_entries WHERE namespace = ?1 AND key = ?2 AND owner_agent_id = ?3 AND (expires_at IS NULL OR expires_at > ?4)",
        params![namespace, key, caller_agent_id, now],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound("key not found".to_string()));
    }
    Ok(())
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<SharedMemoryEntry> {
    Ok(SharedMemoryEntry {
        key: row.get(0)?,
        namespace: row.get(1)?,
        value: row.get(2)?,
        owner_agent_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        expires_at: row.get(6)?,
        description: row.get(7)?,
    })
}
