use crate::error::{AppError, AppResult};
use crate::events::AgentEvent;
use crate::models::{RegisterWebhook, Webhook, WebhookDelivery, VALID_EVENT_TYPES};
use crate::store::{generate_id, Store};
use hmac::{Hmac, Mac};
use rusqlite::{params, Connection};
use sha2::Sha256;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

type HmacSha256 = Hmac<Sha256>;

pub fn register(store: &Store, agent_id: &str, body: RegisterWebhook) -> AppResult<String> {
    for event_type in &body.event_types {
        if !VALID_EVENT_TYPES.contains(&event_type.as_str()) {
            return Err(AppError::BadRequest(format!("unknown event type: {event_type}")));
        }
    }

    let webhook_id = generate_id("wh");
    let now = chrono::Utc::now().to_rfc3339();
    store.conn().execute(
        "INSERT INTO webhooks (webhook_id, agent_id, url, event_types, secret, active, created_at) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
        params![&webhook_id, agent_id, &body.url, serde_json::to_string(&body.event_types).unwrap_or_default(), &body.secret, &now],
    )?;
    Ok(webhook_id)
}

pub fn list(store: &Store, agent_id: &str) -> AppResult<Vec<Webhook>> {
    let conn = store.conn();
    let mut stmt = conn.prepare(
        "SELECT webhook_id, agent_id, url, event_types, secret, active, created_at FROM webhooks WHERE agent_id = ?1 ORDER BY created_at ASC",
    )?;
    let rows = stmt.query_map(params![agent_id], row_to_webhook)?.filter_map(|r| r.ok()).collect();
    Ok(rows)
}

pub fn delete(store: &Store, agent_id: &str, webhook_id: &str) -> AppResult<()> {
    let conn = store.conn();
    let changed = conn.execute("DELETE FROM webhooks WHERE webhook_id = ?1 AND agent_id = ?2", params![webhook_id, agent_id])?;
    if changed == 0 {
        return Err(AppError::NotFound("webhook not found".to_string()));
    }
    Ok(())
}

/// Spawns a background task that subscribes to the EventBus and fires
/// matching webhooks. Fire-and-forget per delivery: network errors are
/// swallowed at this boundary (spec.md §4.I).
pub fn spawn_dispatcher(mut receiver: broadcast::Receiver<AgentEvent>, db_path: String, webhook_timeout_secs: u64) {
    tokio::spawn(async move {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(webhook_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        let conn = Arc::new(Mutex::new(
            Connection::open(&db_path).expect("Webhook dispatcher: failed to open DB"),
        ));
        conn.lock().unwrap_or_else(|e| e.into_inner()).execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;").ok();

        loop {
            match receiver.recv().await {
                Ok(event) => deliver_webhooks(&conn, &client, &event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(missed = n, "webhook dispatcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("webhook dispatcher: channel closed, exiting");
                    break;
                }
            }
        }
    });
}

async fn deliver_webhooks(conn: &Arc<Mutex<Connection>>, client: &reqwest::Client, event: &AgentEvent) {
    let event_type = event.event_type();
    let agent_id = event.recipient().to_string();
    let data = event.to_json();

    let webhooks: Vec<(String, String, String, Option<String>)> = {
        let db = conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = match db.prepare(
            "SELECT webhook_id, url, event_types, secret FROM webhooks WHERE agent_id = ?1 AND active = 1",
        ) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "webhook dispatcher: query failed");
                return;
            }
        };
        stmt.query_map(params![agent_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    };

    for (webhook_id, url, event_types_json, secret) in webhooks {
        let allowed: Vec<String> = serde_json::from_str(&event_types_json).unwrap_or_default();
        if !allowed.iter().any(|e| e == event_type) {
            continue;
        }

        let payload = WebhookDelivery {
            event: event_type.to_string(),
            agent_id: agent_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: data.clone(),
        };
        let body = serde_json::to_string(&payload).unwrap_or_default();

        let mut request = client.post(&url).header("Content-Type", "application/json");
        if let Some(secret) = &secret
            && let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes())
        {
            mac.update(body.as_bytes());
            request = request.header("X-Signature", hex::encode(mac.finalize().into_bytes()));
        }

        let request = request.body(body);
        tokio::spawn(async move {
            match request.send().await {
                Ok(resp) if !resp.status().is_success() => {
                    tracing::warn!(webhook_id, status = %resp.status(), "webhook delivery rejected");
                }
                Err(e) => tracing::warn!(webhook_id, error = %e, "webhook delivery failed"),
                _ => {}
            }
        });
    }
}

fn row_to_webhook(row: &rusqlite::Row) -> rusqlite::Result<Webhook> {
    let event_types_str: String = row.get(3)?;
    Ok(Webhook {
        webhook_id: row.get(0)?,
        agent_id: row.get(1)?,
        url: row.get(2)?,
        event_types: serde_json::from_str(&event_types_str).unwrap_or_default(),
        secret: row.get(4)?,
        active: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}
