use serde::{Deserialize, Serialize};

use super::local_records::LocalDnsRecord;

/// DNS resolution configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    /// Preferred upstream resolver (e.g. "1.1.1.1:53"). Port defaults to 53.
    #[serde(default = "default_upstream")]
    pub upstream: String,

    /// Per-transport timeout in milliseconds. The exchanger additionally
    /// races every upstream exchange against a fixed 5s deadline.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,

    /// TTL used when an upstream answer carries no records to take one from.
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,

    /// TTL attached to answers synthesised from local records.
    #[serde(default = "default_ttl")]
    pub local_ttl: u32,

    /// DNS server (usually the router) asked for reverse lookups of
    /// private addresses, e.g. "192.168.1.1:53".
    #[serde(default)]
    pub local_dns_server: Option<String>,

    /// Static hostname → IP overrides, consulted when upstream has no answer.
    /// Hostnames may use a leading wildcard: `*.lan`.
    #[serde(default)]
    pub local_records: Vec<LocalDnsRecord>,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream: default_upstream(),
            query_timeout: default_query_timeout(),
            default_ttl: default_ttl(),
            local_ttl: default_ttl(),
            local_dns_server: None,
            local_records: vec![],
        }
    }
}

fn default_upstream() -> String {
    "1.1.1.1:53".to_string()
}

fn default_query_timeout() -> u64 {
    2000
}

fn default_ttl() -> u32 {
    60
}
