use crate::events::{AgentEvent, EventBus};
use crate::models::SendMessage;
use crate::store::Store;
use rocket::futures::{SinkExt, StreamExt};
use rocket_ws as ws;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Process-local registry of live push-socket connections, keyed by
/// `agent_id`. A single agent may hold several open connections; pushes fan
/// out to all of them (spec.md §4.J). Each connection is keyed by a
/// monotonically increasing id rather than its position in a `Vec`, so
/// disconnecting one connection never invalidates another's handle.
type ConnectionsByAgent = HashMap<String, HashMap<u64, mpsc::UnboundedSender<ws::Message>>>;

#[derive(Clone, Default)]
pub struct PushHub {
    connections: Arc<RwLock<ConnectionsByAgent>>,
    next_id: Arc<AtomicU64>,
}

impl PushHub {
    pub fn register(&self, agent_id: &str) -> (u64, mpsc::UnboundedReceiver<ws::Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut conns = self.connections.write().unwrap_or_else(|e| e.into_inner());
        conns.entry(agent_id.to_string()).or_default().insert(id, tx);
        (id, rx)
    }

    pub fn unregister(&self, agent_id: &str, id: u64) {
        let mut conns = self.connections.write().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = conns.get_mut(agent_id) {
            slot.remove(&id);
            if slot.is_empty() {
                conns.remove(agent_id);
            }
        }
    }

    pub fn push_to(&self, agent_id: &str, message: ws::Message) {
        let conns = self.connections.read().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = conns.get(agent_id) {
            for sender in slot.values() {
                let _ = sender.send(message.clone());
            }
        }
    }

    pub fn connection_count(&self) -> usize {
        let conns = self.connections.read().unwrap_or_else(|e| e.into_inner());
        conns.values().map(|v| v.len()).sum()
    }
}

/// Inbound frame shape accepted over the socket: identical to a Relay `send`
/// request, plus the two error-producing omissions named in spec.md §4.J.
#[derive(Debug, serde::Deserialize)]
struct InboundFrame {
    #[serde(default)]
    to_agent: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    payload: Option<String>,
}

/// Runs one push-socket session to completion: handles inbound relay frames,
/// pushes server-originated events to this connection, and cleans up the
/// registry entry on disconnect however the connection ends.
pub async fn run_session(
    stream: ws::stream::DuplexStream,
    hub: PushHub,
    store: Arc<Store>,
    events: Arc<EventBus>,
    agent_id: String,
) -> ws::result::Result<()> {
    let (mut sink, mut read) = stream.split();
    let (connection_id, mut outbound_rx) = hub.register(&agent_id);
    let mut event_rx = events.sender.subscribe();

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(ws::Message::Text(text))) => {
                        let reply = handle_inbound(&store, &events, &agent_id, &text);
                        if sink.send(ws::Message::Text(reply.to_string())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(ws::Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
            Some(msg) = outbound_rx.recv() => {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            Ok(event) = event_rx.recv() => {
                if event.recipient() == agent_id
                    && let AgentEvent::MessageReceived { message_id, from_agent, channel, payload, created_at, .. } = &event
                {
                    let frame = serde_json::json!({
                        "event": "message.received",
                        "from_agent": from_agent,
                        "channel": channel,
                        "payload": payload,
                        "message_id": message_id,
                        "created_at": created_at,
                    });
                    if sink.send(ws::Message::Text(frame.to_string())).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    hub.unregister(&agent_id, connection_id);
    Ok(())
}

fn handle_inbound(store: &Store, events: &EventBus, from_agent: &str, text: &str) -> serde_json::Value {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(_) => return serde_json::json!({"error": "invalid frame"}),
    };

    let (Some(to_agent), Some(payload)) = (frame.to_agent, frame.payload) else {
        return serde_json::json!({"error": "missing to_agent or payload"});
    };

    match crate::relay::send(store, events, from_agent, SendMessage { to_agent, payload, channel: frame.channel }) {
        Ok(resp) => serde_json::json!({"status": "delivered", "message_id": resp.message_id}),
        Err(e) => serde_json::json!({"error": e.to_string()}),
    }
}
