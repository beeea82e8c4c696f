use crate::dns_record::RecordType;
use crate::ClientIdentity;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Transport a query arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Udp,
    Tcp,
    Dot,
    Doh,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Udp => "UDP",
            Protocol::Tcp => "TCP",
            Protocol::Dot => "DoT",
            Protocol::Doh => "DoH",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one resolved query, handed to the log pipeline exactly once.
#[derive(Debug, Clone)]
pub struct RequestLogEntry {
    pub domain: Arc<str>,
    pub status: &'static str,
    pub query_type: RecordType,
    pub protocol: Protocol,
    /// Addresses (or target names) carried by the answers, in answer order.
    pub resolved: Vec<String>,
    pub blocked: bool,
    pub cached: bool,
    pub response_size: usize,
    pub timestamp: DateTime<Utc>,
    pub elapsed: Duration,
    pub client: ClientIdentity,
}

impl RequestLogEntry {
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed.as_micros() as u64
    }
}
