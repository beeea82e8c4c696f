use serde::{Deserialize, Serialize};

/// Static resolution override for a hostname.
///
/// Consulted when the upstream resolver returns no answer. The hostname may
/// be an exact name (`nas.home.lan`) or a leading wildcard (`*.home.lan`),
/// which matches every name below the suffix but not the suffix itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalDnsRecord {
    /// Hostname or wildcard pattern (e.g. "nas", "*.lab.local")
    pub hostname: String,

    /// Optional domain appended to the hostname (e.g. "home.lan")
    #[serde(default)]
    pub domain: Option<String>,

    /// IP address (IPv4 or IPv6)
    /// Examples: "192.168.1.100", "10.0.0.50", "2001:db8::1"
    pub ip: String,
}

impl LocalDnsRecord {
    /// Build the name this record answers for, lower-cased and without a
    /// trailing dot.
    ///
    /// # Examples
    /// ```
    /// use sinkhole_domain::config::LocalDnsRecord;
    ///
    /// let record = LocalDnsRecord {
    ///     hostname: "nas".into(),
    ///     domain: Some("lab.local".into()),
    ///     ip: "192.168.1.100".into(),
    /// };
    /// assert_eq!(record.fqdn(), "nas.lab.local");
    ///
    /// let record = LocalDnsRecord {
    ///     hostname: "*.Home.Lan.".into(),
    ///     domain: None,
    ///     ip: "192.168.1.1".into(),
    /// };
    /// assert_eq!(record.fqdn(), "*.home.lan");
    /// ```
    pub fn fqdn(&self) -> String {
        let name = match self.domain {
            Some(ref domain) => format!("{}.{}", self.hostname, domain),
            None => self.hostname.clone(),
        };
        name.trim_end_matches('.').to_ascii_lowercase()
    }

    pub fn is_wildcard(&self) -> bool {
        self.hostname.starts_with("*.")
    }
}
