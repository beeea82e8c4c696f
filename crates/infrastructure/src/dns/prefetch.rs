//! Prefetch refresher
//!
//! Keeps registered `(domain, type)` pairs warm by pushing synthetic requests
//! through the resolution pipeline, and evicts expired entries nobody asked
//! to keep.

use rustc_hash::{FxHashMap, FxHashSet};
use sinkhole_domain::{DnsQuery, PrefetchedDomain, RecordType};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::pipeline::{ptr, ResolutionPipeline};
use super::server::Request;

/// What one refresher pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Registered domains resolved because they were missing or too old.
    pub prefetched: usize,
    /// Expired registered entries re-resolved.
    pub refreshed: usize,
    /// Expired unregistered entries removed.
    pub evicted: usize,
    /// Re-resolutions that came back without answers.
    pub failed: usize,
}

pub struct PrefetchRefresher {
    pipeline: Arc<ResolutionPipeline>,
    domains: Mutex<FxHashMap<String, PrefetchedDomain>>,
}

impl PrefetchRefresher {
    pub fn new(pipeline: Arc<ResolutionPipeline>) -> Self {
        Self {
            pipeline,
            domains: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn with_domains(self, domains: impl IntoIterator<Item = PrefetchedDomain>) -> Self {
        let mut map = FxHashMap::default();
        for domain in domains {
            if !ptr::is_reverse_query(&domain.query) {
                map.insert(domain.query.cache_key(), domain);
            }
        }
        Self {
            pipeline: self.pipeline,
            domains: Mutex::new(map),
        }
    }

    /// Register `domain`, replacing any previous registration for the same
    /// key. Reverse lookups are never cached and are refused.
    pub async fn add(&self, domain: PrefetchedDomain) -> bool {
        if ptr::is_reverse_query(&domain.query) {
            warn!(domain = %domain.domain(), "Reverse lookups cannot be prefetched");
            return false;
        }

        let key = domain.query.cache_key();
        info!(domain = %domain.domain(), record_type = %domain.query.record_type, "Prefetch domain registered");
        self.domains.lock().await.insert(key, domain);
        true
    }

    pub async fn remove(&self, domain: &str, record_type: RecordType) -> bool {
        let key = DnsQuery::new(domain, record_type).cache_key();
        let removed = self.domains.lock().await.remove(&key).is_some();
        if removed {
            info!(domain, record_type = %record_type, "Prefetch domain removed");
        }
        removed
    }

    pub async fn list(&self) -> Vec<PrefetchedDomain> {
        let mut domains: Vec<PrefetchedDomain> =
            self.domains.lock().await.values().cloned().collect();
        domains.sort_by(|a, b| a.query.cache_key().cmp(&b.query.cache_key()));
        domains
    }

    /// One refresher pass. Registration changes wait for the pass to finish.
    pub async fn tick(&self) -> RefreshReport {
        let domains = self.domains.lock().await;
        let cache = self.pipeline.cache();
        let mut report = RefreshReport::default();
        let now = Instant::now();
        let mut attempted: FxHashSet<&str> = FxHashSet::default();

        for (key, registered) in domains.iter() {
            let due = match cache.peek(key) {
                None => true,
                Some(entry) => {
                    entry.expires_at <= now
                        || now.saturating_duration_since(entry.cached_at) >= registered.refresh
                }
            };

            if due {
                attempted.insert(key.as_str());
                if self.resolve(&registered.query).await {
                    report.prefetched += 1;
                } else {
                    report.failed += 1;
                }
            }
        }

        // Registered keys already tried above wait for the next pass.
        for entry in cache.expired_entries() {
            if attempted.contains(entry.key.as_str()) {
                continue;
            }
            if domains.contains_key(&entry.key) {
                if self.resolve(&entry.query).await {
                    report.refreshed += 1;
                } else {
                    report.failed += 1;
                }
            } else if cache.remove_if_expired(&entry.key, entry.generation) {
                report.evicted += 1;
            }
        }

        if report != RefreshReport::default() {
            debug!(
                prefetched = report.prefetched,
                refreshed = report.refreshed,
                evicted = report.evicted,
                failed = report.failed,
                "Prefetch pass complete"
            );
        }

        report
    }

    async fn resolve(&self, query: &DnsQuery) -> bool {
        let request = match Request::prefetch(query) {
            Ok(request) => request,
            Err(e) => {
                warn!(domain = %query.domain, error = %e, "Cannot build prefetch request");
                return false;
            }
        };

        let resolution = self.pipeline.resolve(&request).await;
        if resolution.answers.is_empty() {
            debug!(domain = %query.domain, rcode = ?resolution.rcode, "Prefetch returned no answers");
            return false;
        }
        true
    }
}
