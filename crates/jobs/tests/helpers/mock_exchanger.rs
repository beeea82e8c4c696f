#![allow(dead_code)]

use async_trait::async_trait;
use sinkhole_domain::DnsQuery;
use sinkhole_infrastructure::dns::{UpstreamAnswer, UpstreamExchanger};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Upstream that always fails, counting how often it was asked.
#[derive(Default)]
pub struct CountingExchanger {
    calls: AtomicUsize,
}

impl CountingExchanger {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamExchanger for CountingExchanger {
    async fn exchange(&self, _query: &DnsQuery) -> UpstreamAnswer {
        self.calls.fetch_add(1, Ordering::SeqCst);
        UpstreamAnswer::server_failure(60)
    }
}
