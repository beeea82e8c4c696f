use hickory_proto::op::Message;
use sinkhole_application::use_cases::ResolveClientIdentityUseCase;
use sinkhole_domain::{DomainError, Protocol, RequestLogEntry};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::debug;

use super::request::Request;
use super::writer::{ReplyWriter, UdpReplyWriter};
use crate::dns::events::{ClientActivity, LiveFeed};
use crate::dns::forwarding::MessageBuilder;
use crate::dns::pipeline::ResolutionPipeline;
use crate::dns::query_logger::RequestLogSender;

/// Entry point shared by every listener: bytes in, one reply out, one log
/// entry published.
#[derive(Clone)]
pub struct DnsServerHandler {
    pipeline: Arc<ResolutionPipeline>,
    identities: Arc<ResolveClientIdentityUseCase>,
    log: RequestLogSender,
    feed: LiveFeed,
}

impl DnsServerHandler {
    pub fn new(
        pipeline: Arc<ResolutionPipeline>,
        identities: Arc<ResolveClientIdentityUseCase>,
        log: RequestLogSender,
    ) -> Self {
        Self {
            pipeline,
            identities,
            log,
            feed: LiveFeed::new_disabled(),
        }
    }

    pub fn with_live_feed(mut self, feed: LiveFeed) -> Self {
        self.feed = feed;
        self
    }

    pub fn pipeline(&self) -> &Arc<ResolutionPipeline> {
        &self.pipeline
    }

    /// Answer one wire-format message.
    ///
    /// Malformed or question-less messages get a FORMERR reply on the stream
    /// and datagram transports. DoH callers receive the error and answer with
    /// HTTP 400 themselves.
    pub async fn handle(
        &self,
        bytes: &[u8],
        writer: Arc<dyn ReplyWriter>,
        protocol: Protocol,
    ) -> Result<RequestLogEntry, DomainError> {
        let received_at = Instant::now();
        match Self::parse(bytes) {
            Ok(message) => self.answer(message, writer, protocol, received_at).await,
            Err(reason) => self.reject(bytes, writer.as_ref(), protocol, &reason).await,
        }
    }

    /// Answer one UDP datagram from `peer`. Replies larger than the size the
    /// query advertised through EDNS (512 without it) go out truncated.
    pub async fn handle_datagram(
        &self,
        bytes: &[u8],
        socket: Arc<UdpSocket>,
        peer: SocketAddr,
    ) -> Result<RequestLogEntry, DomainError> {
        let received_at = Instant::now();
        match Self::parse(bytes) {
            Ok(message) => {
                let writer = UdpReplyWriter::new(socket, peer)
                    .with_max_size(UdpReplyWriter::payload_limit(&message));
                self.answer(message, Arc::new(writer), Protocol::Udp, received_at)
                    .await
            }
            Err(reason) => {
                let writer = UdpReplyWriter::new(socket, peer);
                self.reject(bytes, &writer, Protocol::Udp, &reason).await
            }
        }
    }

    fn parse(bytes: &[u8]) -> Result<Message, String> {
        match Message::from_vec(bytes) {
            Ok(message) if !message.queries().is_empty() => Ok(message),
            Ok(_) => Err("message has no question".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn answer(
        &self,
        message: Message,
        writer: Arc<dyn ReplyWriter>,
        protocol: Protocol,
        received_at: Instant,
    ) -> Result<RequestLogEntry, DomainError> {
        let client = self.identities.execute(writer.remote_addr().ip()).await;
        let request = Request::new(message, writer, protocol, client, received_at)?;
        let entry = self.pipeline.process(request).await;

        self.feed.emit_query(&entry);
        self.feed.emit_activity(ClientActivity::from(&entry));
        self.log.send(entry.clone()).await;

        Ok(entry)
    }

    async fn reject(
        &self,
        bytes: &[u8],
        writer: &dyn ReplyWriter,
        protocol: Protocol,
        reason: &str,
    ) -> Result<RequestLogEntry, DomainError> {
        debug!(client = %writer.remote_addr(), protocol = %protocol, reason, "Malformed DNS message");

        if protocol != Protocol::Doh {
            let reply = MessageBuilder::format_error(bytes);
            if let Err(e) = writer.write_reply(&reply).await {
                debug!(client = %writer.remote_addr(), error = %e, "Failed to write FORMERR");
            }
        }

        Err(DomainError::InvalidDnsMessage(reason.to_string()))
    }
}
