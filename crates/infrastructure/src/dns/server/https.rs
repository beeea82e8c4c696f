//! DNS over HTTPS (RFC 8484)
//!
//! One route, `/dns-query`, accepting `GET ?dns=<base64url>` and `POST` with
//! an `application/dns-message` body. Served over TLS when a certificate is
//! configured, otherwise as plain HTTP for use behind a terminating proxy.

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use hyper_util::server::graceful::GracefulShutdown;
use sinkhole_domain::{DomainError, Protocol};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};

use super::handler::DnsServerHandler;
use super::writer::{DohReplyWriter, ReplyWriter, MAX_UDP_REPLY_SIZE};

pub const DOH_PATH: &str = "/dns-query";
pub const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";
/// Largest accepted DNS message, GET or POST.
pub const MAX_DOH_MESSAGE_SIZE: usize = MAX_UDP_REPLY_SIZE;
pub const DEFAULT_DOH_TIMEOUT: Duration = Duration::from_secs(5);

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct DohState {
    handler: Arc<DnsServerHandler>,
    deadline: Duration,
}

impl DohState {
    pub fn new(handler: Arc<DnsServerHandler>) -> Self {
        Self {
            handler,
            deadline: DEFAULT_DOH_TIMEOUT,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn router(self) -> Router {
        Router::new()
            .route(DOH_PATH, any(dns_query))
            .with_state(self)
    }
}

async fn dns_query(State(state): State<DohState>, request: Request) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0)
        .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)));

    let message = match extract_message(request).await {
        Ok(message) => message,
        Err(status) => {
            debug!(client = %peer, status = status.as_u16(), "DoH request rejected");
            return status.into_response();
        }
    };

    let (writer, reply) = DohReplyWriter::new(peer);
    let writer: Arc<dyn ReplyWriter> = Arc::new(writer);

    let work = async {
        state.handler.handle(&message, writer, Protocol::Doh).await?;
        reply
            .await
            .map_err(|_| DomainError::TransportError("DoH reply was never written".to_string()))
    };

    match timeout(state.deadline, work).await {
        Ok(Ok(bytes)) => (
            [
                (header::CONTENT_TYPE, DNS_MESSAGE_CONTENT_TYPE),
                (header::CACHE_CONTROL, "max-age=0"),
            ],
            bytes,
        )
            .into_response(),
        Ok(Err(DomainError::InvalidDnsMessage(_))) => StatusCode::BAD_REQUEST.into_response(),
        Ok(Err(e)) => {
            warn!(client = %peer, error = %e, "DoH request failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(_) => {
            warn!(client = %peer, deadline_ms = state.deadline.as_millis() as u64, "DoH request timed out");
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
    }
}

async fn extract_message(request: Request) -> Result<Vec<u8>, StatusCode> {
    match *request.method() {
        Method::GET => {
            let encoded = request
                .uri()
                .query()
                .and_then(|query| query.split('&').find_map(|pair| pair.strip_prefix("dns=")))
                .ok_or(StatusCode::BAD_REQUEST)?;

            if encoded.len() > MAX_DOH_MESSAGE_SIZE * 4 / 3 + 4 {
                return Err(StatusCode::PAYLOAD_TOO_LARGE);
            }

            let message = URL_SAFE_NO_PAD
                .decode(encoded.trim_end_matches('='))
                .map_err(|_| StatusCode::BAD_REQUEST)?;

            if message.len() > MAX_DOH_MESSAGE_SIZE {
                return Err(StatusCode::PAYLOAD_TOO_LARGE);
            }
            if message.is_empty() {
                return Err(StatusCode::BAD_REQUEST);
            }
            Ok(message)
        }
        Method::POST => {
            if !is_dns_message(request.headers()) {
                return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
            }

            let body = axum::body::to_bytes(request.into_body(), MAX_DOH_MESSAGE_SIZE)
                .await
                .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

            if body.is_empty() {
                return Err(StatusCode::BAD_REQUEST);
            }
            Ok(body.to_vec())
        }
        _ => Err(StatusCode::METHOD_NOT_ALLOWED),
    }
}

fn is_dns_message(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|media_type| media_type.trim().eq_ignore_ascii_case(DNS_MESSAGE_CONTENT_TYPE))
        .unwrap_or(false)
}

pub struct DohServer {
    listener: TcpListener,
    state: DohState,
    tls: Option<TlsAcceptor>,
}

impl DohServer {
    pub async fn bind(
        addr: SocketAddr,
        state: DohState,
        tls: Option<TlsAcceptor>,
    ) -> Result<Self, DomainError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to bind DoH {}: {}", addr, e)))?;

        Ok(Self {
            listener,
            state,
            tls,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DomainError> {
        self.listener
            .local_addr()
            .map_err(|e| DomainError::IoError(e.to_string()))
    }

    pub async fn serve(self, shutdown: CancellationToken) {
        let router = self.state.router();
        let bind_address = self.listener.local_addr().ok();

        match self.tls {
            Some(acceptor) => {
                info!(protocol = "DoH", tls = true, bind_address = ?bind_address, "DNS listener ready");
                serve_tls(self.listener, acceptor, router, shutdown).await;
            }
            None => {
                info!(protocol = "DoH", tls = false, bind_address = ?bind_address, "DNS listener ready");
                let service = router.into_make_service_with_connect_info::<SocketAddr>();
                if let Err(e) = axum::serve(self.listener, service)
                    .with_graceful_shutdown(async move { shutdown.cancelled().await })
                    .await
                {
                    error!(error = %e, "DoH server failed");
                }
            }
        }

        info!(protocol = "DoH", "DNS listener stopped");
    }
}

async fn serve_tls(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    router: Router,
    shutdown: CancellationToken,
) {
    let graceful = GracefulShutdown::new();
    let builder = Builder::new(TokioExecutor::new());
    let mut connections = JoinSet::new();

    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => continue,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "DoH accept failed");
                    continue;
                }
            },
        };

        let acceptor = acceptor.clone();
        let router = router.clone();
        let builder = builder.clone();
        let watcher = graceful.watcher();
        let shutdown = shutdown.clone();

        connections.spawn(async move {
            let handshake = tokio::select! {
                _ = shutdown.cancelled() => return,
                handshake = timeout(HANDSHAKE_TIMEOUT, acceptor.accept(stream)) => handshake,
            };
            let tls_stream = match handshake {
                Ok(Ok(tls_stream)) => tls_stream,
                Ok(Err(e)) => {
                    debug!(client = %peer, error = %e, "TLS handshake failed");
                    return;
                }
                Err(_) => {
                    debug!(client = %peer, "TLS handshake timed out");
                    return;
                }
            };

            let service = hyper::service::service_fn(move |mut request: hyper::Request<hyper::body::Incoming>| {
                request.extensions_mut().insert(ConnectInfo(peer));
                router.clone().oneshot(request.map(Body::new))
            });

            let connection = builder.serve_connection(TokioIo::new(tls_stream), service);
            if let Err(e) = watcher.watch(connection).await {
                debug!(client = %peer, error = %e, "DoH connection closed with error");
            }
        });
    }

    drop(listener);

    // Idle connections close at once; in-flight requests get a grace period.
    if timeout(SHUTDOWN_GRACE, graceful.shutdown()).await.is_err() {
        warn!(
            connections = connections.len(),
            "DoH connections still open after grace period, aborting"
        );
    }
    connections.shutdown().await;
}
