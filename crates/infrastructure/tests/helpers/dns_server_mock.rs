#![allow(dead_code)]

use hickory_proto::op::Message;
use sinkhole_infrastructure::dns::forwarding::MessageBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::CancellationToken;

use super::builders::a_record;

#[derive(Clone, Copy)]
enum Behavior {
    Answer,
    /// UDP replies come back truncated and empty; TCP answers in full.
    TruncateUdp,
    /// A second socket answers with a forged address first, then the real
    /// server replies.
    OffPathFirst,
    /// Never replies.
    Silent,
}

pub const FORGED_IP: &str = "198.51.100.66";

/// Upstream DNS server on localhost answering every question with one A
/// record.
pub struct MockDnsServer {
    addr: SocketAddr,
    udp_queries: Arc<AtomicUsize>,
    tcp_queries: Arc<AtomicUsize>,
    shutdown: CancellationToken,
}

impl MockDnsServer {
    pub async fn answering(ip: &'static str, ttl: u32) -> Self {
        Self::start(Behavior::Answer, ip, ttl).await
    }

    pub async fn truncating(ip: &'static str, ttl: u32) -> Self {
        Self::start(Behavior::TruncateUdp, ip, ttl).await
    }

    pub async fn off_path_first(ip: &'static str, ttl: u32) -> Self {
        Self::start(Behavior::OffPathFirst, ip, ttl).await
    }

    pub async fn silent() -> Self {
        Self::start(Behavior::Silent, "0.0.0.0", 0).await
    }

    async fn start(behavior: Behavior, ip: &'static str, ttl: u32) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let listener = TcpListener::bind(addr).await.unwrap();

        let udp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_queries = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();

        let udp_count = udp_queries.clone();
        let udp_shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                let (len, peer) = tokio::select! {
                    _ = udp_shutdown.cancelled() => break,
                    received = socket.recv_from(&mut buf) => match received {
                        Ok(received) => received,
                        Err(_) => continue,
                    },
                };
                udp_count.fetch_add(1, Ordering::SeqCst);

                let reply = match behavior {
                    Behavior::Silent => continue,
                    Behavior::Answer => Self::answer(&buf[..len], ip, ttl, false),
                    Behavior::TruncateUdp => Self::answer(&buf[..len], ip, ttl, true),
                    Behavior::OffPathFirst => {
                        if let Some(forged) = Self::answer(&buf[..len], FORGED_IP, ttl, false) {
                            let intruder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
                            let _ = intruder.send_to(&forged, peer).await;
                            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        }
                        Self::answer(&buf[..len], ip, ttl, false)
                    }
                };
                if let Some(reply) = reply {
                    let _ = socket.send_to(&reply, peer).await;
                }
            }
        });

        let tcp_count = tcp_queries.clone();
        let tcp_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                let (mut stream, _) = tokio::select! {
                    _ = tcp_shutdown.cancelled() => break,
                    accepted = listener.accept() => match accepted {
                        Ok(accepted) => accepted,
                        Err(_) => continue,
                    },
                };
                tcp_count.fetch_add(1, Ordering::SeqCst);

                tokio::spawn(async move {
                    let mut len_buf = [0u8; 2];
                    if stream.read_exact(&mut len_buf).await.is_err() {
                        return;
                    }
                    let mut query = vec![0u8; usize::from(u16::from_be_bytes(len_buf))];
                    if stream.read_exact(&mut query).await.is_err() {
                        return;
                    }
                    if let Some(reply) = Self::answer(&query, ip, ttl, false) {
                        let mut frame = (reply.len() as u16).to_be_bytes().to_vec();
                        frame.extend_from_slice(&reply);
                        let _ = stream.write_all(&frame).await;
                    }
                });
            }
        });

        Self {
            addr,
            udp_queries,
            tcp_queries,
            shutdown,
        }
    }

    fn answer(query: &[u8], ip: &str, ttl: u32, truncate: bool) -> Option<Vec<u8>> {
        let request = Message::from_vec(query).ok()?;
        let mut reply = MessageBuilder::reply_to(&request);

        if truncate {
            reply.set_truncated(true);
        } else {
            let name = request.queries().first()?.name().to_utf8();
            reply.add_answer(a_record(&name, ip, ttl));
        }

        MessageBuilder::encode(&reply).ok()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.tcp_queries.load(Ordering::SeqCst)
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
