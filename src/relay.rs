use crate::error::{AppError, AppResult};
use crate::events::{AgentEvent, EventBus};
use crate::models::{InboxMessage, SendMessage, SendMessageResponse};
use crate::store::{generate_id, Store};
use rusqlite::{params, OptionalExtension};

pub fn send(store: &Store, events: &EventBus, from_agent: &str, body: SendMessage) -> AppResult<SendMessageResponse> {
    let conn = store.conn();

    let recipient_exists: Option<String> = conn
        .query_row("SELECT agent_id FROM agents WHERE agent_id = ?1", params![&body.to_agent], |r| r.get(0))
        .optional()?;
    if recipient_exists.is_none() {
        return Err(AppError::NotFound("recipient not found".to_string()));
    }

    let message_id = generate_id("msg");
    let now = chrono::Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO messages (message_id, from_agent, to_agent, channel, payload, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&message_id, from_agent, &body.to_agent, &body.channel, &body.payload, &now],
    )?;
    drop(conn);

    events.publish(AgentEvent::MessageReceived {
        to_agent: body.to_agent,
        message_id: message_id.clone(),
        from_agent: from_agent.to_string(),
        channel: body.channel,
        payload: body.payload,
        created_at: now.clone(),
    });

    Ok(SendMessageResponse { message_id, delivered_at: now })
}

pub fn inbox(
    store: &Store,
    agent_id: &str,
    channel: Option<&str>,
    unread_only: bool,
) -> AppResult<Vec<InboxMessage>> {
    let conn = store.conn();
    let mut stmt = conn.prepare(
        "SELECT message_id, from_agent, channel, payload, created_at, read_at FROM messages
         WHERE to_agent = ?1
         AND (?2 IS NULL OR channel = ?2)
         AND (?3 = 0 OR read_at IS NULL)
         ORDER BY created_at ASC",
    )?;
    let rows = stmt
        .query_map(params![agent_id, channel, unread_only], row_to_message)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(rows)
}

/// Marking an already-read message read again is a no-op success, not an
/// error — idempotent per spec.md §4.F.
pub fn mark_read(store: &Store, agent_id: &str, message_id: &str) -> AppResult<()> {
    let conn = store.conn();
    let now = chrono::Utc::now().to_rfc3339();
    let changed = conn.execute(
        "UPDATE messages SET read_at = ?1 WHERE message_id = ?2 AND to_agent = ?3 AND read_at IS NULL",
        params![&now, message_id, agent_id],
    )?;
    if changed == 0 {
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM messages WHERE message_id = ?1 AND to_agent = ?2",
                params![message_id, agent_id],
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(AppError::NotFound("message not found".to_string()));
        }
    }
    Ok(())
}

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<InboxMessage> {
    Ok(InboxMessage {
        message_id: row.get(0)?,
        from_agent: row.get(1)?,
        channel: row.get(2)?,
        payload: row.get(3)?,
        created_at: row.get(4)?,
        read_at: row.get(5)?,
    })
}
