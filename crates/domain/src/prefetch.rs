use crate::{DnsQuery, RecordType};
use std::time::Duration;

/// A domain registered to be kept warm in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchedDomain {
    pub query: DnsQuery,
    /// Re-resolve at least this often, even if the upstream TTL is longer.
    pub refresh: Duration,
}

impl PrefetchedDomain {
    pub fn new(domain: &str, record_type: RecordType, refresh_secs: u64) -> Self {
        Self {
            query: DnsQuery::new(domain, record_type),
            refresh: Duration::from_secs(refresh_secs.max(1)),
        }
    }

    pub fn domain(&self) -> &str {
        &self.query.domain
    }
}
