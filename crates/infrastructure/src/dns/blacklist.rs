use rustc_hash::FxHashSet;
use sinkhole_application::ports::BlacklistPort;

/// Blacklist held in memory, seeded from the `[blocking]` section.
///
/// A listed domain also blocks all of its subdomains. The whitelist is
/// checked the same way and always wins.
pub struct InMemoryBlacklist {
    blocked: FxHashSet<String>,
    allowed: FxHashSet<String>,
}

impl InMemoryBlacklist {
    pub fn new<B, A>(blocked: B, allowed: A) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        Self {
            blocked: blocked.into_iter().map(|d| Self::normalize(d.as_ref())).collect(),
            allowed: allowed.into_iter().map(|d| Self::normalize(d.as_ref())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }

    fn normalize(domain: &str) -> String {
        domain.trim().trim_end_matches('.').to_ascii_lowercase()
    }

    /// The domain itself, then each parent: `a.b.c`, `b.c`, `c`.
    fn suffixes(domain: &str) -> impl Iterator<Item = &str> {
        std::iter::successors(Some(domain), |d| d.split_once('.').map(|(_, rest)| rest))
    }

    fn matches(set: &FxHashSet<String>, domain: &str) -> bool {
        Self::suffixes(domain).any(|suffix| set.contains(suffix))
    }
}

impl BlacklistPort for InMemoryBlacklist {
    fn is_blacklisted(&self, domain: &str) -> bool {
        if self.blocked.is_empty() {
            return false;
        }
        let domain = Self::normalize(domain);
        Self::matches(&self.blocked, &domain) && !Self::matches(&self.allowed, &domain)
    }
}
