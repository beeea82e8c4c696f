use serde::{Deserialize, Serialize};

/// Database configuration for query logging
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL (default: "sqlite://sinkhole.db")
    #[serde(default = "default_db_url")]
    pub url: String,

    /// Flush the log batch once it holds this many entries
    #[serde(default = "default_log_batch_size")]
    pub log_batch_size: usize,

    /// Flush the log batch at least this often, in seconds
    #[serde(default = "default_log_flush_interval_secs")]
    pub log_flush_interval_secs: u64,

    /// Capacity of the queue between resolvers and the log consumer
    #[serde(default = "default_log_queue_capacity")]
    pub log_queue_capacity: usize,

    /// How long a resolver waits for queue space before dropping the entry
    #[serde(default = "default_log_enqueue_timeout_ms")]
    pub log_enqueue_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            log_batch_size: default_log_batch_size(),
            log_flush_interval_secs: default_log_flush_interval_secs(),
            log_queue_capacity: default_log_queue_capacity(),
            log_enqueue_timeout_ms: default_log_enqueue_timeout_ms(),
        }
    }
}

fn default_db_url() -> String {
    "sqlite://sinkhole.db".to_string()
}

fn default_log_batch_size() -> usize {
    1000
}

fn default_log_flush_interval_secs() -> u64 {
    10
}

fn default_log_queue_capacity() -> usize {
    10_000
}

fn default_log_enqueue_timeout_ms() -> u64 {
    1000
}
