/// Port for sinkhole membership checks.
///
/// Called on the hot path for every forward query, so the check is
/// synchronous: implementations keep their lists in memory.
pub trait BlacklistPort: Send + Sync {
    /// `domain` is the bare, lower-cased name without the trailing dot.
    fn is_blacklisted(&self, domain: &str) -> bool;
}
