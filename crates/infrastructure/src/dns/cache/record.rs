use hickory_proto::rr::Record;
use sinkhole_domain::DnsQuery;
use std::time::Duration;
use tokio::time::Instant;

/// Cache value: the answer set of one `(name, type)` question.
#[derive(Debug, Clone)]
pub struct CachedRecord {
    pub records: Vec<Record>,
    pub expires_at: Instant,
    pub cached_at: Instant,
    /// TTL the entry was stored with, in seconds.
    pub ttl: u32,
    /// Key the entry lives under; set by `DnsCache::store`.
    pub key: String,
    pub query: DnsQuery,
    /// Store generation; set by `DnsCache::store`.
    pub generation: u64,
}

impl CachedRecord {
    pub fn new(query: DnsQuery, records: Vec<Record>, ttl: u32) -> Self {
        let now = Instant::now();
        Self {
            records,
            expires_at: now + Duration::from_secs(u64::from(ttl)),
            cached_at: now,
            ttl,
            key: query.cache_key(),
            query,
            generation: 0,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at <= now
    }

    pub fn remaining_secs(&self, now: Instant) -> u32 {
        self.expires_at.saturating_duration_since(now).as_secs() as u32
    }
}

/// Result of a cache hit: records with their TTL rewritten to what is left.
#[derive(Debug, Clone)]
pub struct CachedAnswer {
    pub records: Vec<Record>,
    pub remaining_ttl: u32,
}

/// Metadata of an entry, without the records.
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    pub key: String,
    pub query: DnsQuery,
    pub cached_at: Instant,
    pub expires_at: Instant,
    pub ttl: u32,
    pub generation: u64,
}

impl From<&CachedRecord> for CacheEntryInfo {
    fn from(record: &CachedRecord) -> Self {
        Self {
            key: record.key.clone(),
            query: record.query.clone(),
            cached_at: record.cached_at,
            expires_at: record.expires_at,
            ttl: record.ttl,
            generation: record.generation,
        }
    }
}
