use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::Record;
use sinkhole_application::ports::NotificationSink;
use sinkhole_domain::{DnsQuery, DomainError, NotificationSeverity};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::forwarding::{MessageBuilder, ResponseParser};
use super::transport::tcp::TcpTransport;
use super::transport::udp::UdpTransport;
use super::transport::DnsTransport;

/// Hard ceiling on one upstream exchange, whatever the transport timeout.
pub const EXCHANGE_DEADLINE: Duration = Duration::from_secs(5);

/// Answer section of an upstream reply, reduced to what the pipeline needs.
#[derive(Debug, Clone)]
pub struct UpstreamAnswer {
    pub answers: Vec<Record>,
    /// Minimum TTL across `answers`, or the configured default when empty.
    pub min_ttl: u32,
    pub rcode: ResponseCode,
}

impl UpstreamAnswer {
    pub fn server_failure(default_ttl: u32) -> Self {
        Self {
            answers: Vec::new(),
            min_ttl: default_ttl,
            rcode: ResponseCode::ServFail,
        }
    }
}

/// Sends exactly one question to an upstream resolver.
///
/// Never fails: transport and decoding errors surface as `SERVFAIL`.
#[async_trait]
pub trait UpstreamExchanger: Send + Sync {
    async fn exchange(&self, query: &DnsQuery) -> UpstreamAnswer;
}

/// Forwards to a single preferred upstream over UDP, retrying over TCP only
/// when the UDP reply comes back truncated.
pub struct ForwardingExchanger {
    server: SocketAddr,
    udp: UdpTransport,
    tcp: TcpTransport,
    timeout: Duration,
    deadline: Duration,
    default_ttl: u32,
    notifications: Option<Arc<dyn NotificationSink>>,
}

impl ForwardingExchanger {
    pub fn new(server: SocketAddr, timeout: Duration, default_ttl: u32) -> Self {
        Self {
            server,
            udp: UdpTransport::new(server),
            tcp: TcpTransport::new(server),
            timeout,
            deadline: EXCHANGE_DEADLINE,
            default_ttl,
            notifications: None,
        }
    }

    pub fn with_notifications(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(sink);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    async fn forward(&self, query: &DnsQuery) -> Result<UpstreamAnswer, DomainError> {
        let (id, bytes) = MessageBuilder::build_query(&query.domain, &query.record_type)?;

        let udp_response = self.udp.send(&bytes, self.timeout).await?;
        let mut response = ResponseParser::parse(&udp_response.bytes)?;

        if response.truncated {
            debug!(domain = %query.domain, server = %self.server, "Truncated UDP reply, retrying over TCP");
            let tcp_response = self.tcp.send(&bytes, self.timeout).await?;
            response = ResponseParser::parse(&tcp_response.bytes)?;
        }

        if response.id != id {
            return Err(DomainError::InvalidDnsMessage(format!(
                "Upstream reply ID {} does not match query ID {}",
                response.id, id
            )));
        }

        Ok(UpstreamAnswer {
            min_ttl: response.min_ttl.unwrap_or(self.default_ttl),
            answers: response.answers,
            rcode: response.rcode,
        })
    }

    fn report_failure(&self, query: &DnsQuery, reason: &str) {
        warn!(
            domain = %query.domain,
            record_type = %query.record_type,
            server = %self.server,
            reason,
            "Upstream exchange failed"
        );

        if let Some(ref sink) = self.notifications {
            sink.notify(
                NotificationSeverity::Warning,
                "upstream",
                &format!(
                    "Query {} {} to {} failed: {}",
                    query.domain, query.record_type, self.server, reason
                ),
            );
        }
    }
}

#[async_trait]
impl UpstreamExchanger for ForwardingExchanger {
    async fn exchange(&self, query: &DnsQuery) -> UpstreamAnswer {
        tokio::select! {
            result = self.forward(query) => match result {
                Ok(answer) => {
                    debug!(
                        domain = %query.domain,
                        answers = answer.answers.len(),
                        min_ttl = answer.min_ttl,
                        rcode = ?answer.rcode,
                        "Upstream answered"
                    );
                    answer
                }
                Err(e) => {
                    self.report_failure(query, &e.to_string());
                    UpstreamAnswer::server_failure(self.default_ttl)
                }
            },
            _ = tokio::time::sleep(self.deadline) => {
                self.report_failure(query, "deadline exceeded");
                UpstreamAnswer::server_failure(self.default_ttl)
            }
        }
    }
}
