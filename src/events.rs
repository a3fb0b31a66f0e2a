use tokio::sync::broadcast;

/// The closed set of webhook/push event types named in the spec:
/// `message.received`, `job.completed`, `job.failed`.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    MessageReceived {
        to_agent: String,
        message_id: String,
        from_agent: String,
        channel: Option<String>,
        payload: String,
        created_at: String,
    },
    JobCompleted {
        agent_id: String,
        job_id: String,
        result: Option<String>,
    },
    JobFailed {
        agent_id: String,
        job_id: String,
        error: Option<String>,
        dead: bool,
    },
}

impl AgentEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AgentEvent::MessageReceived { .. } => "message.received",
            AgentEvent::JobCompleted { .. } => "job.completed",
            AgentEvent::JobFailed { .. } => "job.failed",
        }
    }

    /// The agent this event is delivered to — the webhook/push recipient,
    /// per spec.md §3 tenant-isolation rules (submitter for job events,
    /// recipient for message events).
    pub fn recipient(&self) -> &str {
        match self {
            AgentEvent::MessageReceived { to_agent, .. } => to_agent,
            AgentEvent::JobCompleted { agent_id, .. } => agent_id,
            AgentEvent::JobFailed { agent_id, .. } => agent_id,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AgentEvent::MessageReceived { message_id, from_agent, channel, payload, created_at, .. } => {
                serde_json::json!({
                    "from_agent": from_agent,
                    "channel": channel,
                    "payload": payload,
                    "message_id": message_id,
                    "created_at": created_at,
                })
            }
            AgentEvent::JobCompleted { job_id, result, .. } => {
                serde_json::json!({"job_id": job_id, "result": result})
            }
            AgentEvent::JobFailed { job_id, error, dead, .. } => {
                serde_json::json!({"job_id": job_id, "error": error, "dead": dead})
            }
        }
    }
}

/// Broadcasts domain events to the webhook dispatcher and the push socket hub.
pub struct EventBus {
    pub sender: broadcast::Sender<AgentEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);
        EventBus { sender }
    }

    pub fn publish(&self, event: AgentEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }
}
