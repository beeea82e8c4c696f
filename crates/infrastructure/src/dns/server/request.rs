use chrono::{DateTime, Utc};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use sinkhole_domain::{ClientIdentity, DnsQuery, DomainError, Protocol};
use std::sync::Arc;
use tokio::time::Instant;

use super::writer::{NoopReplyWriter, ReplyWriter};
use crate::dns::forwarding::{MessageBuilder, RecordTypeMapper};

/// One inbound query, whatever transport it arrived on.
///
/// Created once per message and consumed by the pipeline, which writes the
/// reply through `writer` exactly once.
pub struct Request {
    pub message: Message,
    /// First question of `message`.
    pub query: DnsQuery,
    pub writer: Arc<dyn ReplyWriter>,
    pub received_at: Instant,
    pub timestamp: DateTime<Utc>,
    pub client: ClientIdentity,
    /// Synthetic request from the prefetch refresher.
    pub prefetch: bool,
    pub protocol: Protocol,
}

impl Request {
    pub fn new(
        message: Message,
        writer: Arc<dyn ReplyWriter>,
        protocol: Protocol,
        client: ClientIdentity,
        received_at: Instant,
    ) -> Result<Self, DomainError> {
        let query = Self::first_question(&message)?;
        Ok(Self {
            message,
            query,
            writer,
            received_at,
            timestamp: Utc::now(),
            client,
            prefetch: false,
            protocol,
        })
    }

    /// Request the refresher pushes through the pipeline: no client, no
    /// blacklist, and a writer that discards the reply.
    pub fn prefetch(query: &DnsQuery) -> Result<Self, DomainError> {
        let question = MessageBuilder::question(&query.domain, &query.record_type)?;
        let mut message = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(question);

        let writer: Arc<dyn ReplyWriter> = Arc::new(NoopReplyWriter);
        let client = ClientIdentity::unknown(writer.remote_addr().ip());

        Ok(Self {
            message,
            query: query.clone(),
            writer,
            received_at: Instant::now(),
            timestamp: Utc::now(),
            client,
            prefetch: true,
            protocol: Protocol::Udp,
        })
    }

    pub fn question(&self) -> Option<&Query> {
        self.message.queries().first()
    }

    fn first_question(message: &Message) -> Result<DnsQuery, DomainError> {
        let question = message
            .queries()
            .first()
            .ok_or_else(|| DomainError::InvalidDnsMessage("Message has no question".to_string()))?;

        Ok(DnsQuery::new(
            question.name().to_utf8(),
            RecordTypeMapper::from_hickory(question.query_type()),
        ))
    }
}
