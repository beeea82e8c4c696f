use serde::{Deserialize, Serialize};

/// Ad-blocking and domain filtering configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockingConfig {
    /// Enable ad-blocking (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Domains to sinkhole. Subdomains of a listed domain are blocked too.
    #[serde(default)]
    pub custom_blocked: Vec<String>,

    /// Domains to allow even if blocked (whitelist wins)
    #[serde(default)]
    pub whitelist: Vec<String>,

    /// Client IPs that bypass blocking entirely
    #[serde(default)]
    pub bypass_clients: Vec<String>,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            custom_blocked: vec![],
            whitelist: vec![],
            bypass_clients: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}
