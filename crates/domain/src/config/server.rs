use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Plain DNS port, served over both UDP and TCP.
    #[serde(default = "default_dns_port")]
    pub dns_port: u16,

    /// DNS-over-TLS port (RFC 7858). Disabled when unset.
    #[serde(default)]
    pub dot_port: Option<u16>,

    /// DNS-over-HTTPS port (RFC 8484). Disabled when unset.
    #[serde(default)]
    pub doh_port: Option<u16>,

    #[serde(default)]
    pub tls_cert_path: Option<String>,

    #[serde(default)]
    pub tls_key_path: Option<String>,

    /// Deadline for a single DoH request, in milliseconds.
    #[serde(default = "default_doh_timeout_ms")]
    pub doh_timeout_ms: u64,

    /// Idle timeout for TCP and DoT connections, in seconds.
    #[serde(default = "default_tcp_idle_timeout_secs")]
    pub tcp_idle_timeout_secs: u64,
}

impl ServerConfig {
    pub fn has_tls(&self) -> bool {
        self.tls_cert_path.is_some() && self.tls_key_path.is_some()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            dns_port: default_dns_port(),
            dot_port: None,
            doh_port: None,
            tls_cert_path: None,
            tls_key_path: None,
            doh_timeout_ms: default_doh_timeout_ms(),
            tcp_idle_timeout_secs: default_tcp_idle_timeout_secs(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_dns_port() -> u16 {
    53
}

fn default_doh_timeout_ms() -> u64 {
    5000
}

fn default_tcp_idle_timeout_secs() -> u64 {
    10
}
