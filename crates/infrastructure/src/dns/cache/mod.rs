//! In-memory TTL cache shared by the resolution pipeline and the prefetch
//! refresher.
//!
//! Entries are keyed by `DnsQuery::cache_key()`. Point lookups and full scans
//! may run concurrently; a scan never holds a shard lock while the caller
//! mutates the map, and an expired entry is only ever removed if it is still
//! the generation that was observed as expired.

mod metrics;
mod record;

pub use metrics::{CacheMetrics, CacheStats};
pub use record::{CacheEntryInfo, CachedAnswer, CachedRecord};

use dashmap::DashMap;
use sinkhole_domain::DnsQuery;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;
use tracing::debug;

pub struct DnsCache {
    entries: DashMap<String, CachedRecord>,
    generation: AtomicU64,
    metrics: CacheMetrics,
}

impl DnsCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            metrics: CacheMetrics::default(),
        }
    }

    /// Unconditionally overwrite `key`. Empty answer sets are refused.
    pub fn store(&self, key: impl Into<String>, mut record: CachedRecord) -> bool {
        if record.records.is_empty() {
            debug!(domain = %record.query.domain, "Refusing to cache empty answer set");
            return false;
        }

        let key = key.into();
        record.generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        record.key = key.clone();
        self.entries.insert(key, record);
        CacheMetrics::record(&self.metrics.insertions);
        true
    }

    /// Records for `key` with every TTL rewritten to the remaining seconds.
    /// An entry past its expiry is deleted and reported as a miss.
    pub fn load(&self, key: &str) -> Option<CachedAnswer> {
        let now = Instant::now();

        let expired_generation = {
            let entry = match self.entries.get(key) {
                Some(entry) => entry,
                None => {
                    CacheMetrics::record(&self.metrics.misses);
                    return None;
                }
            };

            if !entry.is_expired_at(now) {
                let remaining = entry.remaining_secs(now);
                let records = entry
                    .records
                    .iter()
                    .cloned()
                    .map(|mut r| {
                        r.set_ttl(remaining);
                        r
                    })
                    .collect();
                CacheMetrics::record(&self.metrics.hits);
                return Some(CachedAnswer {
                    records,
                    remaining_ttl: remaining,
                });
            }

            entry.generation
        };

        self.remove_if_expired(key, expired_generation);
        CacheMetrics::record(&self.metrics.misses);
        None
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entry metadata without touching TTLs or metrics. Expired entries are
    /// returned as-is.
    pub fn peek(&self, key: &str) -> Option<CacheEntryInfo> {
        self.entries.get(key).map(|entry| CacheEntryInfo::from(entry.value()))
    }

    /// Snapshot of every entry past its expiry.
    pub fn expired_entries(&self) -> Vec<CacheEntryInfo> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| CacheEntryInfo::from(entry.value()))
            .collect()
    }

    /// Remove `key` if it is still the expired `generation`. A concurrent
    /// store of a fresher answer is left untouched.
    pub fn remove_if_expired(&self, key: &str, generation: u64) -> bool {
        let now = Instant::now();
        let removed = self
            .entries
            .remove_if(key, |_, record| {
                record.generation == generation && record.is_expired_at(now)
            })
            .is_some();

        if removed {
            CacheMetrics::record(&self.metrics.expirations);
        }
        removed
    }

    /// Drop every record type cached for `domain`.
    pub fn invalidate_domain(&self, domain: &str) -> usize {
        let normalized = DnsQuery::normalize(domain);
        let mut removed = 0;
        self.entries.retain(|_, record| {
            let keep = *record.query.domain != *normalized;
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            self.metrics
                .invalidations
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(domain = %normalized, removed, "Cache entries invalidated");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::A;
    use hickory_proto::rr::{Name, RData, Record};
    use sinkhole_domain::RecordType;
    use std::net::Ipv4Addr;
    use std::str::FromStr;
    use std::time::Duration;

    fn a_record(name: &str, ip: Ipv4Addr, ttl: u32) -> Record {
        Record::from_rdata(Name::from_str(name).unwrap(), ttl, RData::A(A(ip)))
    }

    fn entry(domain: &str, ttl: u32) -> (String, CachedRecord) {
        let query = DnsQuery::new(domain, RecordType::A);
        let records = vec![a_record(&query.domain, Ipv4Addr::new(1, 2, 3, 4), ttl)];
        (query.cache_key(), CachedRecord::new(query, records, ttl))
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_rewrites_ttl_to_remaining() {
        let cache = DnsCache::new();
        let (key, record) = entry("api.example.com", 300);
        assert!(cache.store(key.clone(), record));

        assert_eq!(cache.load(&key).unwrap().remaining_ttl, 300);

        tokio::time::advance(Duration::from_secs(1)).await;
        let answer = cache.load(&key).unwrap();
        assert_eq!(answer.remaining_ttl, 299);
        assert!(answer.records.iter().all(|r| r.ttl() == 299));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_removed_on_load() {
        let cache = DnsCache::new();
        let (key, record) = entry("old.example.com", 5);
        cache.store(key.clone(), record);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(cache.load(&key).is_none());
        assert!(!cache.contains(&key));
        assert_eq!(cache.metrics().snapshot().expirations, 1);
    }

    #[tokio::test]
    async fn test_empty_answer_sets_are_refused() {
        let cache = DnsCache::new();
        let query = DnsQuery::new("empty.example.com", RecordType::A);
        let key = query.cache_key();
        assert!(!cache.store(key.clone(), CachedRecord::new(query, vec![], 60)));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_does_not_remove_fresh_store() {
        let cache = DnsCache::new();
        let (key, record) = entry("race.example.com", 1);
        cache.store(key.clone(), record);

        tokio::time::advance(Duration::from_secs(2)).await;
        let stale = cache.expired_entries();
        assert_eq!(stale.len(), 1);

        let (_, fresh) = entry("race.example.com", 60);
        cache.store(key.clone(), fresh);

        assert!(!cache.remove_if_expired(&key, stale[0].generation));
        assert!(cache.load(&key).is_some());
    }

    #[tokio::test]
    async fn test_invalidate_domain_drops_every_type() {
        let cache = DnsCache::new();
        let (key_a, record_a) = entry("nas.home.lan", 60);
        cache.store(key_a, record_a);

        let aaaa = DnsQuery::new("nas.home.lan", RecordType::AAAA);
        let records = vec![a_record("nas.home.lan.", Ipv4Addr::new(10, 0, 0, 1), 60)];
        cache.store(aaaa.cache_key(), CachedRecord::new(aaaa, records, 60));

        let (key_other, record_other) = entry("other.home.lan", 60);
        cache.store(key_other.clone(), record_other);

        assert_eq!(cache.invalidate_domain("NAS.home.lan"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key_other));
    }

    #[tokio::test]
    async fn test_metrics_track_hits_and_misses() {
        let cache = DnsCache::new();
        let (key, record) = entry("metrics.example.com", 60);
        cache.store(key.clone(), record);

        cache.load(&key);
        cache.load("missing.example.com.:1");

        let stats = cache.metrics().snapshot();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.insertions, 1);
        assert!((cache.metrics().hit_rate() - 50.0).abs() < f64::EPSILON);
    }
}
