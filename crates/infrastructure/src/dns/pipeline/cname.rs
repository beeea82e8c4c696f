use futures::future::{BoxFuture, FutureExt};
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{RData, Record};
use rustc_hash::FxHashSet;
use sinkhole_domain::DnsQuery;
use tracing::{debug, warn};

use super::ResolutionPipeline;
use crate::dns::upstream::UpstreamAnswer;

/// Upper bound on hops, on top of cycle detection.
pub const MAX_CNAME_HOPS: usize = 16;

#[derive(Debug)]
pub(super) struct ChainResult {
    pub answers: Vec<Record>,
    pub min_ttl: u32,
    pub rcode: ResponseCode,
}

impl ChainResult {
    fn failed(min_ttl: u32) -> Self {
        Self {
            answers: Vec::new(),
            min_ttl,
            rcode: ResponseCode::ServFail,
        }
    }
}

impl From<UpstreamAnswer> for ChainResult {
    fn from(answer: UpstreamAnswer) -> Self {
        Self {
            answers: answer.answers,
            min_ttl: answer.min_ttl,
            rcode: answer.rcode,
        }
    }
}

/// Target of the last CNAME in an answer set.
pub(super) fn cname_target(answers: &[Record]) -> Option<String> {
    answers.iter().rev().find_map(|record| match record.data() {
        RData::CNAME(canonical) => Some(canonical.to_utf8()),
        _ => None,
    })
}

impl ResolutionPipeline {
    /// Follow the CNAME in `hop` until an answer of the asked type shows up.
    ///
    /// `visited` holds every name already asked in this chain; asking a name
    /// twice fails the whole chain with SERVFAIL. The result carries the
    /// records of every hop and the smallest TTL seen.
    pub(super) fn follow_cname_chain<'a>(
        &'a self,
        query: &'a DnsQuery,
        hop: UpstreamAnswer,
        visited: &'a mut FxHashSet<String>,
        depth: usize,
    ) -> BoxFuture<'a, ChainResult> {
        async move {
            let target = match cname_target(&hop.answers) {
                Some(target) => DnsQuery::new(target, query.record_type),
                None => return ChainResult::from(hop),
            };

            if depth >= MAX_CNAME_HOPS {
                warn!(domain = %query.domain, hops = depth, "CNAME chain too long");
                return ChainResult::failed(hop.min_ttl);
            }

            if !visited.insert(target.domain.to_string()) {
                warn!(domain = %query.domain, target = %target.domain, "CNAME cycle detected");
                return ChainResult::failed(hop.min_ttl);
            }

            debug!(from = %query.domain, to = %target.domain, depth, "Following CNAME");

            let next = self.upstream.exchange(&target).await;
            if next.answers.is_empty() {
                return ChainResult::failed(hop.min_ttl.min(next.min_ttl));
            }

            let rest = if Self::has_terminal(&next.answers, &target) {
                ChainResult::from(next)
            } else {
                self.follow_cname_chain(&target, next, visited, depth + 1).await
            };

            if rest.answers.is_empty() {
                return rest;
            }

            let mut answers = hop.answers;
            answers.extend(rest.answers);
            ChainResult {
                answers,
                min_ttl: hop.min_ttl.min(rest.min_ttl),
                rcode: rest.rcode,
            }
        }
        .boxed()
    }
}
