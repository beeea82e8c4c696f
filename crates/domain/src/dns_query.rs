use super::RecordType;
use std::sync::Arc;

/// DNS query (domain + record type).
/// Uses `Arc<str>` for zero-cost cloning across pipeline → cache → prefetch layers.
///
/// The domain is normalised to a lower-cased, fully qualified name with a
/// trailing dot, so `Example.COM` and `example.com.` share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsQuery {
    pub domain: Arc<str>,
    pub record_type: RecordType,
}

impl DnsQuery {
    pub fn new(domain: impl AsRef<str>, record_type: RecordType) -> Self {
        Self {
            domain: Arc::from(Self::normalize(domain.as_ref()).as_str()),
            record_type,
        }
    }

    /// Cache key shared by the resolution pipeline and the prefetch refresher:
    /// `name + ":" + numeric type`, e.g. `"api.example.com.:1"`.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.domain, self.record_type.code())
    }

    /// Domain without the trailing dot, as shown in logs and matched by lists.
    pub fn bare_domain(&self) -> &str {
        self.domain.strip_suffix('.').unwrap_or(&self.domain)
    }

    pub fn normalize(domain: &str) -> String {
        let lower = domain.trim().to_ascii_lowercase();
        if lower.ends_with('.') {
            lower
        } else {
            format!("{}.", lower)
        }
    }
}
