use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType};
use sinkhole_domain::DomainError;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tracing::debug;

use crate::dns::forwarding::MessageBuilder;

/// Largest reply sent over UDP, whatever the client advertises.
pub const MAX_UDP_REPLY_SIZE: usize = 4096;

/// RFC 1035 limit for clients that sent no OPT record.
pub const MIN_UDP_REPLY_SIZE: usize = 512;

/// Capability to deliver one reply back to the client that asked.
///
/// `write_reply` returns the number of bytes actually written.
#[async_trait]
pub trait ReplyWriter: Send + Sync {
    async fn write_reply(&self, reply: &Message) -> Result<usize, DomainError>;

    fn remote_addr(&self) -> SocketAddr;
}

/// Datagram reply to `peer` on the listener's socket.
pub struct UdpReplyWriter {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
    max_size: usize,
}

impl UdpReplyWriter {
    pub fn new(socket: Arc<UdpSocket>, peer: SocketAddr) -> Self {
        Self {
            socket,
            peer,
            max_size: MIN_UDP_REPLY_SIZE,
        }
    }

    /// Size at which replies are truncated; kept within 512..=4096.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size.clamp(MIN_UDP_REPLY_SIZE, MAX_UDP_REPLY_SIZE);
        self
    }

    /// Reply size the client accepts over UDP: its EDNS payload size, or 512
    /// without an OPT record.
    pub fn payload_limit(query: &Message) -> usize {
        query
            .extensions()
            .as_ref()
            .map(|edns| usize::from(edns.max_payload()))
            .unwrap_or(MIN_UDP_REPLY_SIZE)
            .clamp(MIN_UDP_REPLY_SIZE, MAX_UDP_REPLY_SIZE)
    }

    /// Header and question only, with TC set so the client retries over TCP.
    fn truncated(reply: &Message) -> Message {
        let mut truncated = Message::new(reply.id(), MessageType::Response, reply.op_code());
        truncated.set_recursion_desired(reply.recursion_desired());
        truncated.set_recursion_available(reply.recursion_available());
        truncated.set_response_code(reply.response_code());
        truncated.set_truncated(true);
        for query in reply.queries() {
            truncated.add_query(query.clone());
        }
        if let Some(edns) = reply.extensions() {
            truncated.set_edns(edns.clone());
        }
        truncated
    }
}

#[async_trait]
impl ReplyWriter for UdpReplyWriter {
    async fn write_reply(&self, reply: &Message) -> Result<usize, DomainError> {
        let mut bytes = MessageBuilder::encode(reply)?;
        if bytes.len() > self.max_size {
            debug!(
                peer = %self.peer,
                size = bytes.len(),
                limit = self.max_size,
                "Reply too large for UDP, truncating"
            );
            bytes = MessageBuilder::encode(&Self::truncated(reply))?;
        }

        self.socket
            .send_to(&bytes, self.peer)
            .await
            .map_err(|e| DomainError::IoError(format!("UDP reply to {} failed: {}", self.peer, e)))
    }

    fn remote_addr(&self) -> SocketAddr {
        self.peer
    }
}

/// Length-prefixed reply on a byte stream; shared by TCP and DoT.
pub struct StreamReplyWriter<W> {
    stream: tokio::sync::Mutex<W>,
    peer: SocketAddr,
}

impl<W> StreamReplyWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(stream: W, peer: SocketAddr) -> Self {
        Self {
            stream: tokio::sync::Mutex::new(stream),
            peer,
        }
    }
}

#[async_trait]
impl<W> ReplyWriter for StreamReplyWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_reply(&self, reply: &Message) -> Result<usize, DomainError> {
        let bytes = MessageBuilder::encode(reply)?;
        let len = u16::try_from(bytes.len()).map_err(|_| {
            DomainError::InvalidDnsMessage("Reply too large for stream framing".to_string())
        })?;

        let mut frame = Vec::with_capacity(bytes.len() + 2);
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(&bytes);

        let io_err = |e: std::io::Error| {
            DomainError::IoError(format!("Stream reply to {} failed: {}", self.peer, e))
        };
        let mut stream = self.stream.lock().await;
        stream.write_all(&frame).await.map_err(io_err)?;
        stream.flush().await.map_err(io_err)?;
        Ok(bytes.len())
    }

    fn remote_addr(&self) -> SocketAddr {
        self.peer
    }
}

/// Hands the encoded reply back to the waiting HTTP handler.
pub struct DohReplyWriter {
    tx: Mutex<Option<oneshot::Sender<Vec<u8>>>>,
    peer: SocketAddr,
}

impl DohReplyWriter {
    pub fn new(peer: SocketAddr) -> (Self, oneshot::Receiver<Vec<u8>>) {
        let (tx, rx) = oneshot::channel();
        let writer = Self {
            tx: Mutex::new(Some(tx)),
            peer,
        };
        (writer, rx)
    }
}

#[async_trait]
impl ReplyWriter for DohReplyWriter {
    async fn write_reply(&self, reply: &Message) -> Result<usize, DomainError> {
        let bytes = MessageBuilder::encode(reply)?;
        let size = bytes.len();

        let tx = self
            .tx
            .lock()
            .map_err(|_| DomainError::IoError("DoH reply slot poisoned".to_string()))?
            .take()
            .ok_or(DomainError::ReplyAlreadyWritten)?;

        tx.send(bytes)
            .map_err(|_| DomainError::IoError(format!("DoH client {} went away", self.peer)))?;
        Ok(size)
    }

    fn remote_addr(&self) -> SocketAddr {
        self.peer
    }
}

/// Discards replies; used for prefetch requests.
pub struct NoopReplyWriter;

#[async_trait]
impl ReplyWriter for NoopReplyWriter {
    async fn write_reply(&self, _reply: &Message) -> Result<usize, DomainError> {
        Ok(0)
    }

    fn remote_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    }
}
