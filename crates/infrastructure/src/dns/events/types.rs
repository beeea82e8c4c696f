use chrono::{DateTime, Utc};
use sinkhole_domain::RequestLogEntry;
use std::net::IpAddr;
use std::sync::Arc;

/// One client touching one domain, as shown on an activity feed.
#[derive(Debug, Clone)]
pub struct ClientActivity {
    pub client_ip: IpAddr,
    pub domain: Arc<str>,
    pub blocked: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<&RequestLogEntry> for ClientActivity {
    fn from(entry: &RequestLogEntry) -> Self {
        Self {
            client_ip: entry.client.ip,
            domain: Arc::clone(&entry.domain),
            blocked: entry.blocked,
            timestamp: entry.timestamp,
        }
    }
}
