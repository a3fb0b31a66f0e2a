use serde::{Deserialize, Serialize};

// --- Identity ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgentProfile {
    pub agent_id: String,
    pub name: String,
    pub created_at: String,
    pub last_heartbeat: Option<String>,
    pub status: String,
    pub metadata: serde_json::Value,
    pub description: String,
    pub capabilities: Vec<String>,
    pub public: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterAgent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub agent_id: String,
    pub api_key: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct Heartbeat {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMe {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
    #[serde(default)]
    pub public: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct DirectoryListing {
    pub agents: Vec<AgentProfile>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub stats: SystemStats,
}

#[derive(Debug, Serialize)]
pub struct SystemStats {
    pub active_webhooks: i64,
    pub active_schedules: i64,
    pub websocket_connections: usize,
}

// --- Memory (private and shared) ---

#[derive(Debug, Deserialize)]
pub struct SetMemory {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MemoryEntry {
    pub key: String,
    pub namespace: String,
    pub value: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SharedMemoryEntry {
    pub key: String,
    pub namespace: String,
    pub value: String,
    pub owner_agent_id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MemoryListResponse<T> {
    pub entries: Vec<T>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct NamespacesResponse {
    pub namespaces: Vec<String>,
    pub count: usize,
}

// --- Relay ---

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub to_agent: String,
    pub payload: String,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message_id: String,
    pub delivered_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InboxMessage {
    pub message_id: String,
    pub from_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub payload: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InboxResponse {
    pub messages: Vec<InboxMessage>,
    pub count: usize,
}

// --- Job Queue ---

#[derive(Debug, Deserialize)]
pub struct SubmitJob {
    pub payload: String,
    #[serde(default = "default_queue")]
    pub queue_name: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,
}

pub fn default_queue() -> String {
    "default".to_string()
}

pub fn default_priority() -> i64 {
    5
}

pub fn default_max_attempts() -> i64 {
    3
}

#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub job_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Job {
    pub job_id: String,
    pub agent_id: String,
    pub queue_name: String,
    pub payload: String,
    pub priority: i64,
    pub status: String,
    pub attempts: i64,
    pub max_attempts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_deadline: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ClaimResponse {
    Job(Job),
    Empty { status: &'static str },
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<Job>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CompleteJob {
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FailJob {
    #[serde(default)]
    pub reason: Option<String>,
}

// --- Scheduler ---

#[derive(Debug, Deserialize)]
pub struct CreateSchedule {
    pub cron_expr: String,
    pub payload: String,
    #[serde(default = "default_queue")]
    pub queue_name: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScheduledTask {
    pub task_id: String,
    pub agent_id: String,
    pub cron_expr: String,
    pub payload: String,
    pub queue_name: String,
    pub priority: i64,
    pub max_attempts: i64,
    pub enabled: bool,
    pub next_run_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ScheduleListResponse {
    pub schedules: Vec<ScheduledTask>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ToggleSchedule {
    pub enabled: bool,
}

// --- Webhooks ---

#[derive(Debug, Deserialize)]
pub struct RegisterWebhook {
    pub url: String,
    pub event_types: Vec<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Webhook {
    pub webhook_id: String,
    pub agent_id: String,
    pub url: String,
    pub event_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub active: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookListResponse {
    pub webhooks: Vec<Webhook>,
    pub count: usize,
}

/// Wire body posted to subscriber URLs (spec.md §6 "Webhook delivery format").
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WebhookDelivery {
    pub event: String,
    pub agent_id: String,
    pub timestamp: String,
    pub data: serde_json::Value,
}

pub const VALID_EVENT_TYPES: [&str; 3] = ["message.received", "job.completed", "job.failed"];
