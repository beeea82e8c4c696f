#![allow(dead_code)]

use async_trait::async_trait;
use hickory_proto::op::{Edns, Message, MessageType, OpCode};
use hickory_proto::rr::rdata::{A, AAAA, CNAME};
use hickory_proto::rr::{Name, RData, Record};
use sinkhole_domain::{ClientIdentity, DnsQuery, DomainError, Protocol, RecordType};
use sinkhole_infrastructure::dns::forwarding::MessageBuilder;
use sinkhole_infrastructure::dns::server::{ReplyWriter, Request};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

pub fn a_record(name: &str, ip: &str, ttl: u32) -> Record {
    Record::from_rdata(
        Name::from_str(name).unwrap(),
        ttl,
        RData::A(A(ip.parse().unwrap())),
    )
}

pub fn aaaa_record(name: &str, ip: &str, ttl: u32) -> Record {
    Record::from_rdata(
        Name::from_str(name).unwrap(),
        ttl,
        RData::AAAA(AAAA(ip.parse().unwrap())),
    )
}

pub fn cname_record(name: &str, target: &str, ttl: u32) -> Record {
    Record::from_rdata(
        Name::from_str(name).unwrap(),
        ttl,
        RData::CNAME(CNAME(Name::from_str(target).unwrap())),
    )
}

/// Recursive query message with one question.
pub fn query_message(domain: &str, record_type: RecordType) -> Message {
    let mut message = Message::new(0x4242, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(MessageBuilder::question(domain, &record_type).unwrap());
    message
}

pub fn query_bytes(domain: &str, record_type: RecordType) -> Vec<u8> {
    MessageBuilder::encode(&query_message(domain, record_type)).unwrap()
}

/// Query carrying an OPT record that advertises `max_payload`.
pub fn edns_query_message(domain: &str, record_type: RecordType, max_payload: u16) -> Message {
    let mut message = query_message(domain, record_type);
    let mut edns = Edns::new();
    edns.set_max_payload(max_payload);
    message.set_edns(edns);
    message
}

pub fn edns_query_bytes(domain: &str, record_type: RecordType, max_payload: u16) -> Vec<u8> {
    MessageBuilder::encode(&edns_query_message(domain, record_type, max_payload)).unwrap()
}

/// `count` A records for `name`: 10.0.x.y.
pub fn many_a_records(name: &str, count: usize, ttl: u32) -> Vec<Record> {
    (0..count)
        .map(|i| a_record(name, &format!("10.0.{}.{}", i / 256, i % 256), ttl))
        .collect()
}

pub fn client(ip: &str) -> ClientIdentity {
    ClientIdentity::unknown(ip.parse().unwrap())
}

pub fn request(
    domain: &str,
    record_type: RecordType,
    writer: Arc<RecordingWriter>,
    client: ClientIdentity,
) -> Request {
    Request::new(
        query_message(domain, record_type),
        writer,
        Protocol::Udp,
        client,
        Instant::now(),
    )
    .unwrap()
}

pub fn prefetch_request(domain: &str, record_type: RecordType) -> Request {
    Request::prefetch(&DnsQuery::new(domain, record_type)).unwrap()
}

/// Captures every reply written through it.
pub struct RecordingWriter {
    peer: SocketAddr,
    replies: Mutex<Vec<Message>>,
}

impl RecordingWriter {
    pub fn new(peer: &str) -> Arc<Self> {
        Arc::new(Self {
            peer: peer.parse().unwrap(),
            replies: Mutex::new(Vec::new()),
        })
    }

    pub fn replies(&self) -> Vec<Message> {
        self.replies.lock().unwrap().clone()
    }

    pub fn last(&self) -> Message {
        self.replies
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no reply written")
    }
}

#[async_trait]
impl ReplyWriter for RecordingWriter {
    async fn write_reply(&self, reply: &Message) -> Result<usize, DomainError> {
        let size = MessageBuilder::encode(reply)?.len();
        self.replies.lock().unwrap().push(reply.clone());
        Ok(size)
    }

    fn remote_addr(&self) -> SocketAddr {
        self.peer
    }
}

/// Addresses carried by the answer section, in order.
pub fn answer_ips(message: &Message) -> Vec<IpAddr> {
    message
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            RData::A(a) => Some(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
        .collect()
}

pub fn log_entry(domain: &str) -> sinkhole_domain::RequestLogEntry {
    sinkhole_domain::RequestLogEntry {
        domain: Arc::from(domain),
        status: "NOERROR",
        query_type: RecordType::A,
        protocol: Protocol::Udp,
        resolved: vec!["192.0.2.1".to_string()],
        blocked: false,
        cached: false,
        response_size: 64,
        timestamp: chrono::Utc::now(),
        elapsed: std::time::Duration::from_micros(250),
        client: client("192.168.1.10"),
    }
}
