use crate::error::AppResult;
use crate::identity::row_to_profile;
use crate::models::{AgentProfile, UpdateMe};
use crate::store::Store;
use rusqlite::params;

pub fn update_me(store: &Store, agent_id: &str, body: UpdateMe) -> AppResult<AgentProfile> {
    let conn = store.conn();

    if let Some(description) = &body.description {
        conn.execute("UPDATE agents SET description = ?1 WHERE agent_id = ?2", params![description, agent_id])?;
    }
    if let Some(capabilities) = &body.capabilities {
        conn.execute(
            "UPDATE agents SET capabilities = ?1 WHERE agent_id = ?2",
            params![serde_json::to_string(capabilities).unwrap_or_default(), agent_id],
        )?;
    }
    if let Some(public) = body.public {
        conn.execute("UPDATE agents SET public = ?1 WHERE agent_id = ?2", params![public, agent_id])?;
    }

    drop(conn);
    crate::identity::get_profile(store, agent_id)
}

pub fn get_me(store: &Store, agent_id: &str) -> AppResult<AgentProfile> {
    crate::identity::get_profile(store, agent_id)
}

/// Unauthenticated directory listing — only `public = true` agents are
/// visible, optionally filtered to agents advertising a given capability
/// (spec.md §4.E, case-sensitive exact match against the capabilities array).
pub fn list(store: &Store, capability: Option<&str>) -> AppResult<Vec<AgentProfile>> {
    let conn = store.conn();
    let mut stmt = conn.prepare(
        "SELECT agent_id, name, created_at, last_heartbeat, status, metadata, description, capabilities, public
         FROM agents WHERE public = 1 ORDER BY created_at ASC",
    )?;
    let all: Vec<AgentProfile> = stmt.query_map([], row_to_profile)?.filter_map(|r| r.ok()).collect();

    let filtered = match capability {
        Some(cap) => all.into_iter().filter(|a| a.capabilities.iter().any(|c| c == cap)).collect(),
        None => all,
    };
    Ok(filtered)
}
