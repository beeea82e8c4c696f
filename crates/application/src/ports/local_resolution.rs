use sinkhole_domain::RecordType;
use std::net::IpAddr;

/// Port for statically configured name → address overrides.
pub trait LocalResolutionPort: Send + Sync {
    /// Address for `domain` (bare, lower-cased) whose family matches
    /// `record_type`. Exact entries win over `*.suffix` entries.
    fn find_resolution(&self, domain: &str, record_type: RecordType) -> Option<IpAddr>;
}
