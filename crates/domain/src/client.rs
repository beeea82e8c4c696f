use std::net::IpAddr;
use std::sync::Arc;

/// Identity of the client that sent a query.
///
/// Resolved once per source IP and kept for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub ip: IpAddr,
    pub hostname: Option<Arc<str>>,
    pub mac: Option<Arc<str>>,
    pub vendor: Option<Arc<str>>,
    /// Client bypasses blocking entirely.
    pub bypass: bool,
}

impl ClientIdentity {
    pub fn unknown(ip: IpAddr) -> Self {
        Self {
            ip,
            hostname: None,
            mac: None,
            vendor: None,
            bypass: false,
        }
    }

    pub fn display_name(&self) -> &str {
        self.hostname.as_deref().unwrap_or("unknown")
    }
}
