use serde::{Deserialize, Serialize};

/// Prefetch refresher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrefetchConfig {
    /// Refresher tick, in milliseconds (default: 500)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Domains registered at startup
    #[serde(default)]
    pub domains: Vec<PrefetchDomainConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrefetchDomainConfig {
    pub domain: String,

    #[serde(default = "default_record_type")]
    pub record_type: String,

    /// Maximum age of the cached answer before it is re-resolved
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            domains: vec![],
        }
    }
}

fn default_interval_ms() -> u64 {
    500
}

fn default_record_type() -> String {
    "A".to_string()
}

fn default_refresh_secs() -> u64 {
    3600
}
