use std::env;

/// Runtime configuration, read from environment variables with sensible
/// defaults. Mirrors the teacher's `RateLimitConfig::from_env` convention.
///
/// Environment variables:
/// - `AGENTFORGE_DB` — path to the SQLite database file (default: `data/agentforge.db`)
/// - `AGENTFORGE_PORT` — HTTP port to bind (default: 8000)
/// - `AGENTFORGE_RATE_LIMIT_PER_MINUTE` — max authenticated requests per agent per minute (default: 300)
/// - `AGENTFORGE_VISIBILITY_TIMEOUT_SECS` — job claim visibility deadline (default: 300)
/// - `AGENTFORGE_SCHEDULER_TICK_SECS` — scheduler tick interval, must be <= 60 (default: 5)
/// - `AGENTFORGE_WEBHOOK_TIMEOUT_SECS` — outbound webhook request timeout (default: 5)
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub port: u16,
    pub rate_limit_per_minute: usize,
    pub visibility_timeout_secs: i64,
    pub scheduler_tick_secs: u64,
    pub webhook_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "data/agentforge.db".to_string(),
            port: 8000,
            rate_limit_per_minute: 300,
            visibility_timeout_secs: 300,
            scheduler_tick_secs: 5,
            webhook_timeout_secs: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("AGENTFORGE_DB") {
            config.db_path = val;
        }
        if let Ok(val) = env::var("AGENTFORGE_PORT")
            && let Ok(n) = val.parse::<u16>()
        {
            config.port = n;
        }
        if let Ok(val) = env::var("AGENTFORGE_RATE_LIMIT_PER_MINUTE")
            && let Ok(n) = val.parse::<usize>()
        {
            config.rate_limit_per_minute = n;
        }
        if let Ok(val) = env::var("AGENTFORGE_VISIBILITY_TIMEOUT_SECS")
            && let Ok(n) = val.parse::<i64>()
        {
            config.visibility_timeout_secs = n;
        }
        if let Ok(val) = env::var("AGENTFORGE_SCHEDULER_TICK_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.scheduler_tick_secs = n.clamp(1, 60);
        }
        if let Ok(val) = env::var("AGENTFORGE_WEBHOOK_TIMEOUT_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            config.webhook_timeout_secs = n;
        }

        config
    }
}
