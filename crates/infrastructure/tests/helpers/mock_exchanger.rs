#![allow(dead_code)]

use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::Record;
use sinkhole_domain::{DnsQuery, RecordType};
use sinkhole_infrastructure::dns::upstream::{UpstreamAnswer, UpstreamExchanger};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::builders::{a_record, cname_record};

pub const DEFAULT_TTL: u32 = 60;

/// Upstream with canned answers per `(name, type)`. Unscripted questions get
/// SERVFAIL.
#[derive(Default)]
pub struct ScriptedExchanger {
    answers: Mutex<HashMap<String, UpstreamAnswer>>,
    asked: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedExchanger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, domain: &str, record_type: RecordType, records: Vec<Record>) {
        let min_ttl = records.iter().map(|r| r.ttl()).min().unwrap_or(DEFAULT_TTL);
        self.answers.lock().unwrap().insert(
            DnsQuery::new(domain, record_type).cache_key(),
            UpstreamAnswer {
                answers: records,
                min_ttl,
                rcode: ResponseCode::NoError,
            },
        );
    }

    pub fn answer_a(&self, domain: &str, ip: &str, ttl: u32) {
        let name = DnsQuery::new(domain, RecordType::A).domain.to_string();
        self.answer(domain, RecordType::A, vec![a_record(&name, ip, ttl)]);
    }

    pub fn answer_cname(&self, domain: &str, record_type: RecordType, target: &str, ttl: u32) {
        let name = DnsQuery::new(domain, record_type).domain.to_string();
        self.answer(domain, record_type, vec![cname_record(&name, target, ttl)]);
    }

    pub fn answer_empty(&self, domain: &str, record_type: RecordType, rcode: ResponseCode) {
        self.answers.lock().unwrap().insert(
            DnsQuery::new(domain, record_type).cache_key(),
            UpstreamAnswer {
                answers: Vec::new(),
                min_ttl: DEFAULT_TTL,
                rcode,
            },
        );
    }

    pub fn forget(&self, domain: &str, record_type: RecordType) {
        self.answers
            .lock()
            .unwrap()
            .remove(&DnsQuery::new(domain, record_type).cache_key());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamExchanger for ScriptedExchanger {
    async fn exchange(&self, query: &DnsQuery) -> UpstreamAnswer {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.asked.lock().unwrap().push(query.domain.to_string());
        self.answers
            .lock()
            .unwrap()
            .get(&query.cache_key())
            .cloned()
            .unwrap_or_else(|| UpstreamAnswer::server_failure(DEFAULT_TTL))
    }
}
