use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RData;
use sinkhole_domain::config::LocalDnsRecord;
use sinkhole_domain::{ClientIdentity, RecordType};
use sinkhole_infrastructure::dns::{
    DnsCache, InMemoryBlacklist, LocalRecordsResolver, ResolutionPipeline,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

mod helpers;
use helpers::*;

struct Fixture {
    upstream: Arc<ScriptedExchanger>,
    cache: Arc<DnsCache>,
    pipeline: ResolutionPipeline,
}

impl Fixture {
    fn new() -> Self {
        Self::with_lists(&["ads.example.com"], &[], &[])
    }

    fn with_lists(blocked: &[&str], allowed: &[&str], local: &[LocalDnsRecord]) -> Self {
        let upstream = Arc::new(ScriptedExchanger::new());
        let cache = Arc::new(DnsCache::new());
        let pipeline = ResolutionPipeline::new(
            cache.clone(),
            upstream.clone(),
            Arc::new(InMemoryBlacklist::new(blocked.iter(), allowed.iter())),
            Arc::new(LocalRecordsResolver::new(local)),
        )
        .with_local_ttl(120);

        Self {
            upstream,
            cache,
            pipeline,
        }
    }
}

fn local_record(hostname: &str, domain: Option<&str>, ip: &str) -> LocalDnsRecord {
    LocalDnsRecord {
        hostname: hostname.to_string(),
        domain: domain.map(str::to_string),
        ip: ip.to_string(),
    }
}

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

// ============================================================================
// Sinkhole
// ============================================================================

#[tokio::test]
async fn test_blacklisted_domain_is_sinkholed() {
    let fx = Fixture::new();
    let writer = RecordingWriter::new("192.168.1.10:5353");

    let entry = fx
        .pipeline
        .process(request("ads.example.com", RecordType::A, writer.clone(), client("192.168.1.10")))
        .await;

    let reply = writer.last();
    assert_eq!(reply.response_code(), ResponseCode::NoError);
    assert_eq!(answer_ips(&reply), vec![ip("0.0.0.0"), ip("::")]);
    assert!(entry.blocked);
    assert!(!entry.cached);
    assert_eq!(entry.status, "NOERROR");
    assert_eq!(fx.upstream.calls(), 0);
    assert!(fx.cache.is_empty());
}

#[tokio::test]
async fn test_subdomain_of_blacklisted_domain_is_sinkholed() {
    let fx = Fixture::new();
    let resolution = fx
        .pipeline
        .resolve(&request(
            "pixel.ads.example.com",
            RecordType::AAAA,
            RecordingWriter::new("192.168.1.10:5353"),
            client("192.168.1.10"),
        ))
        .await;

    assert!(resolution.blocked);
    assert_eq!(resolution.answers.len(), 2);
}

#[tokio::test]
async fn test_whitelist_wins_over_blacklist() {
    let fx = Fixture::with_lists(&["example.com"], &["safe.example.com"], &[]);
    fx.upstream.answer_a("safe.example.com", "10.1.1.1", 300);

    let resolution = fx
        .pipeline
        .resolve(&request(
            "safe.example.com",
            RecordType::A,
            RecordingWriter::new("192.168.1.10:5353"),
            client("192.168.1.10"),
        ))
        .await;

    assert!(!resolution.blocked);
    assert_eq!(fx.upstream.calls(), 1);
}

#[tokio::test]
async fn test_bypass_client_skips_blacklist() {
    let fx = Fixture::new();
    fx.upstream.answer_a("ads.example.com", "203.0.113.7", 300);

    let mut identity = client("192.168.1.99");
    identity.bypass = true;

    let entry = fx
        .pipeline
        .process(request(
            "ads.example.com",
            RecordType::A,
            RecordingWriter::new("192.168.1.99:5353"),
            identity,
        ))
        .await;

    assert!(!entry.blocked);
    assert_eq!(entry.resolved, vec!["203.0.113.7".to_string()]);
}

#[tokio::test]
async fn test_pause_skips_blacklist_until_resumed() {
    let fx = Fixture::new();
    fx.upstream.answer_a("ads.example.com", "203.0.113.7", 300);
    let writer = RecordingWriter::new("192.168.1.10:5353");

    fx.pipeline.pause().pause(Duration::from_secs(60));
    let paused = fx
        .pipeline
        .resolve(&request("ads.example.com", RecordType::A, writer.clone(), client("192.168.1.10")))
        .await;
    assert!(!paused.blocked);

    fx.pipeline.pause().resume();
    let resumed = fx
        .pipeline
        .resolve(&request("ads.example.com", RecordType::A, writer, client("192.168.1.10")))
        .await;
    assert!(resumed.blocked);
}

#[tokio::test]
async fn test_disabled_blocking_forwards_everything() {
    let fx = Fixture::new();
    let pipeline = fx.pipeline.with_blocking_enabled(false);
    fx.upstream.answer_a("ads.example.com", "203.0.113.7", 300);

    let resolution = pipeline
        .resolve(&request(
            "ads.example.com",
            RecordType::A,
            RecordingWriter::new("192.168.1.10:5353"),
            client("192.168.1.10"),
        ))
        .await;

    assert!(!resolution.blocked);
    assert_eq!(fx.upstream.calls(), 1);
}

#[tokio::test]
async fn test_prefetch_request_skips_blacklist() {
    let fx = Fixture::new();
    fx.upstream.answer_a("ads.example.com", "203.0.113.7", 300);

    let resolution = fx
        .pipeline
        .resolve(&prefetch_request("ads.example.com", RecordType::A))
        .await;

    assert!(!resolution.blocked);
    assert!(fx.cache.contains("ads.example.com.:1"));
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_upstream_answer_is_cached_then_served_with_remaining_ttl() {
    let fx = Fixture::new();
    fx.upstream.answer_a("api.example.com", "1.2.3.4", 300);
    let writer = RecordingWriter::new("192.168.1.10:5353");

    let first = fx
        .pipeline
        .process(request("api.example.com", RecordType::A, writer.clone(), client("192.168.1.10")))
        .await;

    assert!(!first.cached);
    assert_eq!(first.resolved, vec!["1.2.3.4".to_string()]);
    let entry = fx.cache.peek("api.example.com.:1").expect("entry cached");
    assert_eq!(entry.ttl, 300);
    assert_eq!(entry.expires_at - entry.cached_at, Duration::from_secs(300));

    tokio::time::advance(Duration::from_secs(1)).await;

    let second = fx
        .pipeline
        .process(request("api.example.com", RecordType::A, writer.clone(), client("192.168.1.10")))
        .await;

    assert!(second.cached);
    assert_eq!(writer.last().answers()[0].ttl(), 299);
    assert_eq!(fx.upstream.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_is_resolved_again() {
    let fx = Fixture::new();
    fx.upstream.answer_a("api.example.com", "1.2.3.4", 30);
    let writer = RecordingWriter::new("192.168.1.10:5353");

    fx.pipeline
        .process(request("api.example.com", RecordType::A, writer.clone(), client("192.168.1.10")))
        .await;
    tokio::time::advance(Duration::from_secs(31)).await;

    let entry = fx
        .pipeline
        .process(request("api.example.com", RecordType::A, writer, client("192.168.1.10")))
        .await;

    assert!(!entry.cached);
    assert_eq!(fx.upstream.calls(), 2);
}

#[tokio::test]
async fn test_upstream_failure_is_servfail_and_not_cached() {
    let fx = Fixture::new();
    let writer = RecordingWriter::new("192.168.1.10:5353");

    let entry = fx
        .pipeline
        .process(request("down.example.com", RecordType::A, writer.clone(), client("192.168.1.10")))
        .await;

    assert_eq!(entry.status, "SERVFAIL");
    assert_eq!(writer.last().response_code(), ResponseCode::ServFail);
    assert!(writer.last().answers().is_empty());
    assert!(fx.cache.is_empty());
}

#[tokio::test]
async fn test_empty_answer_set_is_reported_as_servfail() {
    let fx = Fixture::new();
    fx.upstream
        .answer_empty("missing.example.com", RecordType::A, ResponseCode::NXDomain);
    let writer = RecordingWriter::new("192.168.1.10:5353");

    let entry = fx
        .pipeline
        .process(request("missing.example.com", RecordType::A, writer, client("192.168.1.10")))
        .await;

    assert_eq!(entry.status, "SERVFAIL");
    assert!(entry.resolved.is_empty());
}

// ============================================================================
// Static overrides
// ============================================================================

#[tokio::test]
async fn test_static_override_answers_when_upstream_is_empty() {
    let fx = Fixture::with_lists(&[], &[], &[local_record("nas", Some("home.lan"), "192.168.1.50")]);
    fx.upstream
        .answer_empty("nas.home.lan", RecordType::A, ResponseCode::NXDomain);
    let writer = RecordingWriter::new("192.168.1.10:5353");

    let entry = fx
        .pipeline
        .process(request("nas.home.lan", RecordType::A, writer.clone(), client("192.168.1.10")))
        .await;

    let reply = writer.last();
    assert_eq!(entry.status, "NOERROR");
    assert_eq!(answer_ips(&reply), vec![ip("192.168.1.50")]);
    assert_eq!(reply.answers()[0].ttl(), 120);
    assert_eq!(fx.cache.peek("nas.home.lan.:1").map(|e| e.ttl), Some(120));
}

#[tokio::test]
async fn test_upstream_answer_beats_static_override() {
    let fx = Fixture::with_lists(&[], &[], &[local_record("nas", Some("home.lan"), "192.168.1.50")]);
    fx.upstream.answer_a("nas.home.lan", "10.9.9.9", 60);

    let resolution = fx
        .pipeline
        .resolve(&request(
            "nas.home.lan",
            RecordType::A,
            RecordingWriter::new("192.168.1.10:5353"),
            client("192.168.1.10"),
        ))
        .await;

    assert_eq!(resolution.answers.len(), 1);
    assert!(matches!(resolution.answers[0].data(), RData::A(a) if a.0.to_string() == "10.9.9.9"));
}

#[tokio::test]
async fn test_wildcard_override_requires_matching_family() {
    let fx = Fixture::with_lists(&[], &[], &[local_record("*.lab.local", None, "10.0.0.5")]);
    fx.upstream
        .answer_empty("box.lab.local", RecordType::AAAA, ResponseCode::NXDomain);
    fx.upstream
        .answer_empty("box.lab.local", RecordType::A, ResponseCode::NXDomain);

    let writer = RecordingWriter::new("192.168.1.10:5353");
    let v6 = fx
        .pipeline
        .resolve(&request("box.lab.local", RecordType::AAAA, writer.clone(), client("192.168.1.10")))
        .await;
    let v4 = fx
        .pipeline
        .resolve(&request("box.lab.local", RecordType::A, writer, client("192.168.1.10")))
        .await;

    assert!(v6.answers.is_empty());
    assert_eq!(v4.answers.len(), 1);
}

// ============================================================================
// CNAME chains
// ============================================================================

#[tokio::test]
async fn test_cname_chain_is_followed_and_cached_with_minimum_ttl() {
    let fx = Fixture::new();
    fx.upstream
        .answer_cname("www.example.com", RecordType::A, "edge.example.net.", 300);
    fx.upstream
        .answer_cname("edge.example.net", RecordType::A, "cdn.example.org.", 120);
    fx.upstream.answer_a("cdn.example.org", "5.6.7.8", 30);

    let writer = RecordingWriter::new("192.168.1.10:5353");
    let entry = fx
        .pipeline
        .process(request("www.example.com", RecordType::A, writer.clone(), client("192.168.1.10")))
        .await;

    assert_eq!(writer.last().answers().len(), 3);
    assert_eq!(entry.resolved.last().map(String::as_str), Some("5.6.7.8"));
    assert_eq!(fx.cache.peek("www.example.com.:1").map(|e| e.ttl), Some(30));
    assert_eq!(
        fx.upstream.asked(),
        vec!["www.example.com.", "edge.example.net.", "cdn.example.org."]
    );
}

#[tokio::test]
async fn test_cname_cycle_fails_with_servfail() {
    let fx = Fixture::new();
    fx.upstream
        .answer_cname("a.loop.test", RecordType::A, "b.loop.test.", 60);
    fx.upstream
        .answer_cname("b.loop.test", RecordType::A, "a.loop.test.", 60);

    let writer = RecordingWriter::new("192.168.1.10:5353");
    let entry = fx
        .pipeline
        .process(request("a.loop.test", RecordType::A, writer.clone(), client("192.168.1.10")))
        .await;

    assert_eq!(entry.status, "SERVFAIL");
    assert!(writer.last().answers().is_empty());
    assert!(!fx.cache.contains("a.loop.test.:1"));
    assert_eq!(fx.upstream.calls(), 2);
}

#[tokio::test]
async fn test_cname_query_is_answered_directly() {
    let fx = Fixture::new();
    fx.upstream
        .answer_cname("alias.example.com", RecordType::CNAME, "real.example.com.", 60);

    let resolution = fx
        .pipeline
        .resolve(&request(
            "alias.example.com",
            RecordType::CNAME,
            RecordingWriter::new("192.168.1.10:5353"),
            client("192.168.1.10"),
        ))
        .await;

    assert_eq!(resolution.answers.len(), 1);
    assert_eq!(fx.upstream.calls(), 1);
}

// ============================================================================
// Reverse lookups
// ============================================================================

fn ptr_target(resolution: &sinkhole_infrastructure::dns::Resolution) -> Option<String> {
    resolution.answers.iter().find_map(|r| match r.data() {
        RData::PTR(ptr) => Some(ptr.0.to_utf8()),
        _ => None,
    })
}

#[tokio::test]
async fn test_loopback_ptr_is_answered_locally() {
    let fx = Fixture::new();
    let resolution = fx
        .pipeline
        .resolve(&request(
            "1.0.0.127.in-addr.arpa",
            RecordType::PTR,
            RecordingWriter::new("127.0.0.1:5353"),
            client("127.0.0.1"),
        ))
        .await;

    assert_eq!(ptr_target(&resolution).as_deref(), Some("localhost."));
    assert_eq!(fx.upstream.calls(), 0);
}

#[tokio::test]
async fn test_private_ptr_uses_client_history() {
    let fx = Fixture::new();
    let pipeline = fx
        .pipeline
        .with_client_history(Arc::new(StaticClientHistory::with("192.168.1.20", "laptop.lan")));

    let resolution = pipeline
        .resolve(&request(
            "20.1.168.192.in-addr.arpa",
            RecordType::PTR,
            RecordingWriter::new("192.168.1.10:5353"),
            client("192.168.1.10"),
        ))
        .await;

    assert_eq!(ptr_target(&resolution).as_deref(), Some("laptop.lan."));
    assert_eq!(fx.upstream.calls(), 0);
    assert!(fx.cache.is_empty());
}

#[tokio::test]
async fn test_public_ptr_is_forwarded() {
    let fx = Fixture::new();
    let resolution = fx
        .pipeline
        .resolve(&request(
            "8.8.8.8.in-addr.arpa",
            RecordType::PTR,
            RecordingWriter::new("192.168.1.10:5353"),
            client("192.168.1.10"),
        ))
        .await;

    assert_eq!(fx.upstream.asked(), vec!["8.8.8.8.in-addr.arpa."]);
    assert_eq!(resolution.rcode, ResponseCode::ServFail);
}

// ============================================================================
// Reply construction
// ============================================================================

#[tokio::test]
async fn test_reply_copies_header_and_echoes_question() {
    let fx = Fixture::new();
    fx.upstream.answer_a("api.example.com", "1.2.3.4", 300);
    let writer = RecordingWriter::new("192.168.1.10:5353");

    let entry = fx
        .pipeline
        .process(request("api.example.com", RecordType::A, writer.clone(), client("192.168.1.10")))
        .await;

    let replies = writer.replies();
    assert_eq!(replies.len(), 1);
    let reply = &replies[0];
    assert_eq!(reply.id(), 0x4242);
    assert!(reply.recursion_desired());
    assert!(reply.recursion_available());
    assert_eq!(reply.queries().len(), 1);
    assert_eq!(reply.queries()[0].name().to_utf8(), "api.example.com.");
    assert!(entry.response_size > 0);
    assert_eq!(&*entry.domain, "api.example.com");
    assert_eq!(entry.client, ClientIdentity::unknown(ip("192.168.1.10")));
}
