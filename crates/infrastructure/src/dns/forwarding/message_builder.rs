//! DNS Message Builder
//!
//! Constructs DNS messages in wire format using `hickory-proto`: upstream
//! queries, reply skeletons and error replies for the listeners.

use super::record_type_map::RecordTypeMapper;
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::Name;
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use sinkhole_domain::{DomainError, RecordType};
use std::str::FromStr;

/// UDP payload size advertised in the OPT record of our replies.
pub const EDNS_UDP_PAYLOAD: u16 = 4096;

/// Builds DNS messages in wire format
pub struct MessageBuilder;

impl MessageBuilder {
    /// Build a recursive query (random ID, RD set, one question) and return
    /// the ID with the serialized bytes.
    pub fn build_query(domain: &str, record_type: &RecordType) -> Result<(u16, Vec<u8>), DomainError> {
        let query = Self::question(domain, record_type)?;
        let id = fastrand::u16(..);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        let bytes = Self::encode(&message)?;
        Ok((id, bytes))
    }

    /// Single IN-class question for `domain`. The name is always fully
    /// qualified on the wire, with or without a trailing dot in `domain`.
    pub fn question(domain: &str, record_type: &RecordType) -> Result<Query, DomainError> {
        let mut name = Name::from_str(domain).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", domain, e))
        })?;
        name.set_fqdn(true);

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(RecordTypeMapper::to_hickory(record_type));
        query.set_query_class(hickory_proto::rr::DNSClass::IN);
        Ok(query)
    }

    /// Reply header for `request`: ID, opcode and RD copied, RA set, question
    /// section echoed. An OPT record is added when the request carried one.
    pub fn reply_to(request: &Message) -> Message {
        let mut reply = Message::new(request.id(), MessageType::Response, request.op_code());
        reply.set_recursion_desired(request.recursion_desired());
        reply.set_recursion_available(true);
        for query in request.queries() {
            reply.add_query(query.clone());
        }
        if request.extensions().is_some() {
            let mut edns = Edns::new();
            edns.set_max_payload(EDNS_UDP_PAYLOAD);
            reply.set_edns(edns);
        }
        reply
    }

    /// FORMERR reply for a message that could not be parsed. The ID is taken
    /// from the first two bytes when present.
    pub fn format_error(raw: &[u8]) -> Message {
        let id = match raw {
            [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
            _ => 0,
        };
        let mut reply = Message::new(id, MessageType::Response, OpCode::Query);
        reply.set_response_code(ResponseCode::FormErr);
        reply
    }

    /// Serialize a Message to wire format bytes
    pub fn encode(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            DomainError::InvalidDnsMessage(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}
