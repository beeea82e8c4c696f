use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::{RData, Record};
use sinkhole_domain::DomainError;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DnsResponse {
    pub id: u16,

    pub answers: Vec<Record>,

    pub rcode: ResponseCode,

    pub truncated: bool,

    pub min_ttl: Option<u32>,
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(response_bytes: &[u8]) -> Result<DnsResponse, DomainError> {
        let message = Message::from_vec(response_bytes).map_err(|e| {
            DomainError::InvalidDnsMessage(format!("Failed to parse DNS response: {}", e))
        })?;

        let rcode = message.response_code();
        let truncated = message.truncated();
        let answers: Vec<Record> = message.answers().to_vec();
        let min_ttl = Self::min_ttl(&answers);

        debug!(
            rcode = ?rcode,
            answers = answers.len(),
            truncated = truncated,
            "DNS response parsed"
        );

        Ok(DnsResponse {
            id: message.id(),
            answers,
            rcode,
            truncated,
            min_ttl,
        })
    }

    pub fn min_ttl(records: &[Record]) -> Option<u32> {
        records.iter().map(|r| r.ttl()).min()
    }

    /// Printable form of an answer: the address for A/AAAA, the target name
    /// for CNAME/PTR. Other record types yield nothing.
    pub fn answer_to_string(record: &Record) -> Option<String> {
        match record.data() {
            RData::A(a) => Some(a.0.to_string()),
            RData::AAAA(aaaa) => Some(aaaa.0.to_string()),
            RData::CNAME(canonical) => Some(canonical.to_utf8()),
            RData::PTR(ptr) => Some(ptr.to_utf8()),
            _ => None,
        }
    }

    pub fn rcode_to_status(rcode: ResponseCode) -> &'static str {
        match rcode {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::FormErr => "FORMERR",
            _ => "UNKNOWN",
        }
    }
}
