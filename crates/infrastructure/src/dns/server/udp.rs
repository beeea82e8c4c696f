use sinkhole_domain::DomainError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::handler::DnsServerHandler;
use super::writer::MAX_UDP_REPLY_SIZE;

pub struct UdpDnsServer {
    socket: Arc<UdpSocket>,
    handler: Arc<DnsServerHandler>,
}

impl UdpDnsServer {
    pub async fn bind(addr: SocketAddr, handler: Arc<DnsServerHandler>) -> Result<Self, DomainError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to bind UDP {}: {}", addr, e)))?;

        Ok(Self {
            socket: Arc::new(socket),
            handler,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DomainError> {
        self.socket
            .local_addr()
            .map_err(|e| DomainError::IoError(e.to_string()))
    }

    /// Receive datagrams until `shutdown` fires. Each datagram is answered
    /// in its own task.
    pub async fn serve(self, shutdown: CancellationToken) {
        let mut buf = vec![0u8; MAX_UDP_REPLY_SIZE];
        info!(protocol = "UDP", bind_address = ?self.socket.local_addr().ok(), "DNS listener ready");

        loop {
            let (len, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok(received) => received,
                    Err(e) => {
                        error!(error = %e, "UDP receive failed");
                        continue;
                    }
                },
            };

            let bytes = buf[..len].to_vec();
            let socket = Arc::clone(&self.socket);
            let handler = Arc::clone(&self.handler);

            tokio::spawn(async move {
                if let Err(e) = handler.handle_datagram(&bytes, socket, peer).await {
                    debug!(client = %peer, error = %e, "UDP query rejected");
                }
            });
        }

        info!(protocol = "UDP", "DNS listener stopped");
    }
}
