use rusqlite::Connection;
use std::sync::Mutex;

/// Transactional persistence for every table in the system. All other
/// components pass through this type; it is the only one permitted to hold
/// a persistent connection handle.
pub struct Store {
    pub conn: Mutex<Connection>,
}

/// Generate an id with the given tagged prefix: `<prefix>_<32 hex chars>`.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{:032x}", uuid::Uuid::new_v4().as_u128())
}

/// Generate a raw API key: `af_<48 hex chars>`. Only its SHA-256 hash is stored.
pub fn generate_api_key() -> String {
    format!(
        "af_{:032x}{:032x}",
        uuid::Uuid::new_v4().as_u128(),
        uuid::Uuid::new_v4().as_u128()
    )
}

pub fn hash_api_key(key: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

impl Store {
    pub fn new(path: &str) -> Self {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path).expect("Failed to open database");
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .expect("Failed to set pragmas");
        let store = Store { conn: Mutex::new(conn) };
        store.migrate();
        store
    }

    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn migrate(&self) {
        let conn = self.conn();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS agents (
                agent_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                api_key_hash TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                last_heartbeat TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                metadata TEXT NOT NULL DEFAULT '{}',
                description TEXT NOT NULL DEFAULT '',
                capabilities TEXT NOT NULL DEFAULT '[]',
                public INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_agents_public ON agents(public);

            CREATE TABLE IF NOT EXISTS memory_entries (
                agent_id TEXT NOT NULL,
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                expires_at TEXT,
                PRIMARY KEY (agent_id, namespace, key)
            );

            CREATE TABLE IF NOT EXISTS shared_memory_entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                owner_agent_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                expires_at TEXT,
                description TEXT,
                PRIMARY KEY (namespace, key)
            );
            CREATE INDEX IF NOT EXISTS idx_shared_memory_owner ON shared_memory_entries(owner_agent_id);

            CREATE TABLE IF NOT EXISTS messages (
                message_id TEXT PRIMARY KEY,
                from_agent TEXT NOT NULL,
                to_agent TEXT NOT NULL,
                channel TEXT,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL,
                read_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_messages_to_agent ON messages(to_agent, created_at);

            CREATE TABLE IF NOT EXISTS jobs (
                job_id TEXT PRIMARY KEY,
                agent_id TEXT NOT NULL,
                queue_name TEXT NOT NULL DEFAULT 'default',
                payload TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 5,
                status TEXT NOT NULL DEFAULT 'pending',
                attempts INTEGER NOT NULL DEFAULT 0,
                max_attempts INTEGER NOT NULL DEFAULT 3,
                claimed_by TEXT,
                claimed_at TEXT,
                completed_at TEXT,
                result TEXT,
                error TEXT,
                created_at TEXT NOT NULL,
                visibility_deadline TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_jobs_claim ON jobs(status, queue_name, priority DESC, created_at ASC);
            CREATE INDEX IF NOT EXISTS idx_jobs_agent ON jobs(agent_id, queue_name, status);
            CREATE INDEX IF NOT EXISTS idx_jobs_visibility ON jobs(status, visibility_deadline);

            CREATE TABLE IF NOT EXISTS scheduled_tasks (
                task_id TEXT PRIMARY KEY,
                agent_id TEXT NOT NULL,
                cron_expr TEXT NOT NULL,
                payload TEXT NOT NULL,
                queue_name TEXT NOT NULL DEFAULT 'default',
                priority INTEGER NOT NULL DEFAULT 5,
                max_attempts INTEGER NOT NULL DEFAULT 3,
                enabled INTEGER NOT NULL DEFAULT 1,
                next_run_at TEXT NOT NULL,
                last_run_at TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_scheduled_tasks_due ON scheduled_tasks(enabled, next_run_at);
            CREATE INDEX IF NOT EXISTS idx_scheduled_tasks_agent ON scheduled_tasks(agent_id);

            CREATE TABLE IF NOT EXISTS webhooks (
                webhook_id TEXT PRIMARY KEY,
                agent_id TEXT NOT NULL,
                url TEXT NOT NULL,
                event_types TEXT NOT NULL DEFAULT '[]',
                secret TEXT,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_webhooks_agent ON webhooks(agent_id, active);

            CREATE TABLE IF NOT EXISTS rate_windows (
                agent_id TEXT NOT NULL,
                window_start INTEGER NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (agent_id, window_start)
            );",
        )
        .expect("Failed to run migrations");
    }
}
