//! Resolution pipeline
//!
//! Turns a [`Request`] into an answer set and writes exactly one reply:
//!
//! 1. reverse lookups go to the PTR sub-flow;
//! 2. blacklisted names are sinkholed unless blocking is paused, the client
//!    bypasses blocking, or the request is a prefetch;
//! 3. everything else is served from cache, then upstream, then the static
//!    overrides, then by following a CNAME chain. The first source with
//!    answers populates the cache.

mod cname;
mod pause;
pub mod ptr;

pub use cname::MAX_CNAME_HOPS;
pub use pause::BlockingPause;

use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{Name, RData, Record};
use rustc_hash::FxHashSet;
use sinkhole_application::ports::{BlacklistPort, ClientHistory, LocalResolutionPort};
use sinkhole_domain::{DnsQuery, RecordType, RequestLogEntry};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::dns::cache::{CachedRecord, DnsCache};
use crate::dns::forwarding::{MessageBuilder, RecordTypeMapper, ResponseParser};
use crate::dns::server::Request;
use crate::dns::upstream::UpstreamExchanger;

/// Outcome of resolving one request, before the reply is written.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub answers: Vec<Record>,
    pub cached: bool,
    pub blocked: bool,
    pub rcode: ResponseCode,
}

impl Resolution {
    pub fn answered(answers: Vec<Record>, rcode: ResponseCode) -> Self {
        Self {
            answers,
            cached: false,
            blocked: false,
            rcode,
        }
    }

    pub fn failed() -> Self {
        Self::answered(Vec::new(), ResponseCode::ServFail)
    }

    /// Status the reply carries: an empty answer set is always SERVFAIL.
    pub fn reply_code(&self) -> ResponseCode {
        if self.answers.is_empty() {
            ResponseCode::ServFail
        } else {
            self.rcode
        }
    }
}

pub struct ResolutionPipeline {
    cache: Arc<DnsCache>,
    upstream: Arc<dyn UpstreamExchanger>,
    blacklist: Arc<dyn BlacklistPort>,
    local_records: Arc<dyn LocalResolutionPort>,
    client_history: Option<Arc<dyn ClientHistory>>,
    local_dns: Option<Arc<dyn UpstreamExchanger>>,
    pause: Arc<BlockingPause>,
    blocking_enabled: bool,
    local_ttl: u32,
}

impl ResolutionPipeline {
    pub fn new(
        cache: Arc<DnsCache>,
        upstream: Arc<dyn UpstreamExchanger>,
        blacklist: Arc<dyn BlacklistPort>,
        local_records: Arc<dyn LocalResolutionPort>,
    ) -> Self {
        Self {
            cache,
            upstream,
            blacklist,
            local_records,
            client_history: None,
            local_dns: None,
            pause: Arc::new(BlockingPause::new()),
            blocking_enabled: true,
            local_ttl: 60,
        }
    }

    pub fn with_client_history(mut self, history: Arc<dyn ClientHistory>) -> Self {
        self.client_history = Some(history);
        self
    }

    /// Exchanger for the LAN's own DNS server, asked for reverse lookups of
    /// private addresses.
    pub fn with_local_dns(mut self, local_dns: Option<Arc<dyn UpstreamExchanger>>) -> Self {
        self.local_dns = local_dns;
        self
    }

    pub fn with_pause(mut self, pause: Arc<BlockingPause>) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_blocking_enabled(mut self, enabled: bool) -> Self {
        self.blocking_enabled = enabled;
        self
    }

    pub fn with_local_ttl(mut self, ttl: u32) -> Self {
        self.local_ttl = ttl;
        self
    }

    pub fn cache(&self) -> &Arc<DnsCache> {
        &self.cache
    }

    pub fn pause(&self) -> &Arc<BlockingPause> {
        &self.pause
    }

    /// Resolve `request`, write its reply and return the log entry.
    pub async fn process(&self, request: Request) -> RequestLogEntry {
        let resolution = self.resolve(&request).await;
        let reply = Self::build_reply(&request.message, &resolution);

        let response_size = match request.writer.write_reply(&reply).await {
            Ok(size) => size,
            Err(e) => {
                warn!(
                    domain = %request.query.domain,
                    client = %request.writer.remote_addr(),
                    error = %e,
                    "Failed to write reply"
                );
                0
            }
        };

        let status = ResponseParser::rcode_to_status(reply.response_code());
        let resolved: Vec<String> = resolution
            .answers
            .iter()
            .filter_map(ResponseParser::answer_to_string)
            .collect();

        debug!(
            domain = %request.query.domain,
            record_type = %request.query.record_type,
            protocol = %request.protocol,
            status,
            cached = resolution.cached,
            blocked = resolution.blocked,
            answers = resolved.len(),
            "Query processed"
        );

        RequestLogEntry {
            domain: Arc::from(request.query.bare_domain()),
            status,
            query_type: request.query.record_type,
            protocol: request.protocol,
            resolved,
            blocked: resolution.blocked,
            cached: resolution.cached,
            response_size,
            timestamp: request.timestamp,
            elapsed: request.received_at.elapsed(),
            client: request.client,
        }
    }

    /// Run the resolution algorithm without writing a reply.
    pub async fn resolve(&self, request: &Request) -> Resolution {
        let query = &request.query;

        if ptr::is_reverse_query(query) {
            return self.resolve_ptr(query).await;
        }

        if self.should_sinkhole(request) {
            debug!(domain = %query.domain, client = %request.client.ip, "Domain sinkholed");
            return self.sinkhole(query);
        }

        self.resolve_standard(query, request.prefetch).await
    }

    /// Reply for `request`: ID, opcode and RD copied, RA set, questions
    /// echoed, answers attached.
    pub fn build_reply(request: &Message, resolution: &Resolution) -> Message {
        let mut reply = MessageBuilder::reply_to(request);
        for record in &resolution.answers {
            reply.add_answer(record.clone());
        }
        reply.set_response_code(resolution.reply_code());
        reply
    }

    fn should_sinkhole(&self, request: &Request) -> bool {
        if !self.blocking_enabled || self.pause.is_paused() {
            return false;
        }
        if request.prefetch || request.client.bypass {
            return false;
        }
        self.blacklist.is_blacklisted(request.query.bare_domain())
    }

    fn sinkhole(&self, query: &DnsQuery) -> Resolution {
        let name = match Name::from_str(&query.domain) {
            Ok(name) => name,
            Err(_) => return Resolution::failed(),
        };

        let answers = vec![
            Record::from_rdata(name.clone(), self.local_ttl, RData::A(A(Ipv4Addr::UNSPECIFIED))),
            Record::from_rdata(name, self.local_ttl, RData::AAAA(AAAA(Ipv6Addr::UNSPECIFIED))),
        ];

        Resolution {
            answers,
            cached: false,
            blocked: true,
            rcode: ResponseCode::NoError,
        }
    }

    async fn resolve_standard(&self, query: &DnsQuery, skip_cache: bool) -> Resolution {
        let key = query.cache_key();

        if !skip_cache {
            if let Some(hit) = self.cache.load(&key) {
                debug!(domain = %query.domain, remaining_ttl = hit.remaining_ttl, "Cache hit");
                return Resolution {
                    answers: hit.records,
                    cached: true,
                    blocked: false,
                    rcode: ResponseCode::NoError,
                };
            }
        }

        let upstream = self.upstream.exchange(query).await;

        if Self::has_terminal(&upstream.answers, query) {
            self.populate(query, &key, &upstream.answers, upstream.min_ttl);
            return Resolution::answered(upstream.answers, upstream.rcode);
        }

        if upstream.answers.is_empty() {
            if let Some(record) = self.static_override(query) {
                debug!(domain = %query.domain, "Answered from local records");
                let answers = vec![record];
                self.populate(query, &key, &answers, self.local_ttl);
                return Resolution::answered(answers, ResponseCode::NoError);
            }
            return Resolution::answered(Vec::new(), upstream.rcode);
        }

        let mut visited = FxHashSet::default();
        visited.insert(query.domain.to_string());
        let chain = self.follow_cname_chain(query, upstream, &mut visited, 0).await;

        if !chain.answers.is_empty() {
            self.populate(query, &key, &chain.answers, chain.min_ttl);
        }
        Resolution::answered(chain.answers, chain.rcode)
    }

    fn populate(&self, query: &DnsQuery, key: &str, answers: &[Record], ttl: u32) {
        let record = CachedRecord::new(query.clone(), answers.to_vec(), ttl);
        if self.cache.store(key, record) {
            debug!(domain = %query.domain, key, ttl, "Answer cached");
        }
    }

    fn static_override(&self, query: &DnsQuery) -> Option<Record> {
        let ip = self
            .local_records
            .find_resolution(query.bare_domain(), query.record_type)?;
        let name = Name::from_str(&query.domain).ok()?;

        let rdata = match ip {
            IpAddr::V4(v4) => RData::A(A(v4)),
            IpAddr::V6(v6) => RData::AAAA(AAAA(v6)),
        };
        Some(Record::from_rdata(name, self.local_ttl, rdata))
    }

    /// Whether `answers` already hold a record of the asked type.
    fn has_terminal(answers: &[Record], query: &DnsQuery) -> bool {
        if query.record_type == RecordType::ANY {
            return !answers.is_empty();
        }
        answers
            .iter()
            .any(|r| RecordTypeMapper::from_hickory(r.record_type()) == query.record_type)
    }
}
