use sinkhole_domain::{DomainError, Protocol};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::handler::DnsServerHandler;
use super::writer::{ReplyWriter, StreamReplyWriter};

/// Idle time after which a stream connection is closed.
pub const STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TcpDnsServer {
    listener: TcpListener,
    handler: Arc<DnsServerHandler>,
    idle_timeout: Duration,
}

impl TcpDnsServer {
    pub async fn bind(addr: SocketAddr, handler: Arc<DnsServerHandler>) -> Result<Self, DomainError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to bind TCP {}: {}", addr, e)))?;

        Ok(Self {
            listener,
            handler,
            idle_timeout: STREAM_IDLE_TIMEOUT,
        })
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DomainError> {
        self.listener
            .local_addr()
            .map_err(|e| DomainError::IoError(e.to_string()))
    }

    pub async fn serve(self, shutdown: CancellationToken) {
        info!(protocol = "TCP", bind_address = ?self.listener.local_addr().ok(), "DNS listener ready");

        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!(error = %e, "TCP accept failed");
                        continue;
                    }
                },
            };

            let handler = Arc::clone(&self.handler);
            let idle_timeout = self.idle_timeout;
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                serve_stream(stream, peer, handler, idle_timeout, Protocol::Tcp, shutdown).await;
            });
        }

        info!(protocol = "TCP", "DNS listener stopped");
    }
}

/// Read length-prefixed messages from one connection until it closes, stays
/// idle for `idle_timeout`, or `shutdown` fires. Shared by TCP and DoT.
pub(super) async fn serve_stream<S>(
    stream: S,
    peer: SocketAddr,
    handler: Arc<DnsServerHandler>,
    idle_timeout: Duration,
    protocol: Protocol,
    shutdown: CancellationToken,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut reader, write_half) = tokio::io::split(stream);
    let writer: Arc<dyn ReplyWriter> = Arc::new(StreamReplyWriter::new(write_half, peer));

    loop {
        let mut len_buf = [0u8; 2];
        let read = tokio::select! {
            _ = shutdown.cancelled() => break,
            read = timeout(idle_timeout, reader.read_exact(&mut len_buf)) => read,
        };
        match read {
            Ok(Ok(_)) => {}
            Ok(Err(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Ok(Err(e)) => {
                debug!(client = %peer, protocol = %protocol, error = %e, "Stream read failed");
                break;
            }
            Err(_) => {
                debug!(client = %peer, protocol = %protocol, "Idle connection closed");
                break;
            }
        }

        let len = usize::from(u16::from_be_bytes(len_buf));
        if len == 0 {
            break;
        }

        let mut message = vec![0u8; len];
        let read = tokio::select! {
            _ = shutdown.cancelled() => break,
            read = timeout(idle_timeout, reader.read_exact(&mut message)) => read,
        };
        match read {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                debug!(client = %peer, protocol = %protocol, error = %e, "Truncated stream message");
                break;
            }
            Err(_) => {
                debug!(client = %peer, protocol = %protocol, "Timed out reading message body");
                break;
            }
        }

        let handler = Arc::clone(&handler);
        let writer = Arc::clone(&writer);
        tokio::spawn(async move {
            if let Err(e) = handler.handle(&message, writer, protocol).await {
                debug!(client = %peer, protocol = %protocol, error = %e, "Stream query rejected");
            }
        });
    }
}
