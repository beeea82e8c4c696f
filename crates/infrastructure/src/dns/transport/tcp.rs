use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use sinkhole_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// DNS over TCP transport (RFC 7766), two-byte length framing.
pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    async fn exchange(&self, message_bytes: &[u8]) -> Result<Vec<u8>, DomainError> {
        let io_err = |e: std::io::Error| {
            DomainError::TransportError(format!("TCP exchange with {} failed: {}", self.server_addr, e))
        };

        let len = u16::try_from(message_bytes.len()).map_err(|_| {
            DomainError::InvalidDnsMessage("DNS message too large for TCP framing".to_string())
        })?;

        let mut stream = TcpStream::connect(self.server_addr).await.map_err(io_err)?;
        stream.set_nodelay(true).map_err(io_err)?;

        let mut frame = Vec::with_capacity(message_bytes.len() + 2);
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(message_bytes);
        stream.write_all(&frame).await.map_err(io_err)?;

        let response_len = stream.read_u16().await.map_err(io_err)? as usize;
        let mut response = vec![0u8; response_len];
        stream.read_exact(&mut response).await.map_err(io_err)?;
        Ok(response)
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let bytes = tokio::time::timeout(timeout, self.exchange(message_bytes))
            .await
            .map_err(|_| DomainError::QueryTimeout)??;

        debug!(server = %self.server_addr, bytes_received = bytes.len(), "TCP response received");

        Ok(TransportResponse {
            bytes,
            protocol_used: "TCP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}
