use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use sinkhole_domain::{DomainError, Protocol};
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::handler::DnsServerHandler;
use super::tcp::{serve_stream, STREAM_IDLE_TIMEOUT};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a TLS acceptor from PEM certificate chain and private key files.
pub fn load_tls_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, DomainError> {
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| DomainError::TransportError(format!("TLS config error: {}", e)))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| DomainError::TransportError(format!("TLS config error: {}", e)))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, DomainError> {
    let file = File::open(path).map_err(|e| {
        DomainError::IoError(format!("Failed to open certificate {}: {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(file);

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .filter_map(|r| r.ok())
        .collect();

    if certs.is_empty() {
        return Err(DomainError::TransportError(format!(
            "No certificates found in {}",
            path.display()
        )));
    }

    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, DomainError> {
    let file = File::open(path).map_err(|e| {
        DomainError::IoError(format!("Failed to open private key {}: {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(file);

    loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(rustls_pemfile::Item::Pkcs1Key(key))) => return Ok(PrivateKeyDer::Pkcs1(key)),
            Ok(Some(rustls_pemfile::Item::Pkcs8Key(key))) => return Ok(PrivateKeyDer::Pkcs8(key)),
            Ok(Some(rustls_pemfile::Item::Sec1Key(key))) => return Ok(PrivateKeyDer::Sec1(key)),
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                return Err(DomainError::TransportError(format!(
                    "Failed to parse private key: {}",
                    e
                )))
            }
        }
    }

    Err(DomainError::TransportError(format!(
        "No private key found in {}",
        path.display()
    )))
}

/// DNS over TLS: TCP framing behind a TLS handshake.
pub struct DotServer {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    handler: Arc<DnsServerHandler>,
    idle_timeout: Duration,
}

impl DotServer {
    pub async fn bind(
        addr: SocketAddr,
        acceptor: TlsAcceptor,
        handler: Arc<DnsServerHandler>,
    ) -> Result<Self, DomainError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to bind DoT {}: {}", addr, e)))?;

        Ok(Self {
            listener,
            acceptor,
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
        info!(protocol = "DoT", bind_address = ?self.listener.local_addr().ok(), "DNS listener ready");

        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!(error = %e, "DoT accept failed");
                        continue;
                    }
                },
            };

            let acceptor = self.acceptor.clone();
            let handler = Arc::clone(&self.handler);
            let idle_timeout = self.idle_timeout;
            let shutdown = shutdown.clone();

            tokio::spawn(async move {
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

                serve_stream(tls_stream, peer, handler, idle_timeout, Protocol::Dot, shutdown).await;
            });
        }

        info!(protocol = "DoT", "DNS listener stopped");
    }
}
