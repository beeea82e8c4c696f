use crate::di::Services;
use sinkhole_domain::Config;
use sinkhole_infrastructure::dns::server::{
    load_tls_acceptor, DohServer, DohState, DotServer, TcpDnsServer, UdpDnsServer,
};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Bind every configured listener and spawn its serve loop. Binding happens
/// up front so a taken port fails startup instead of a background task.
pub async fn start_dns_servers(
    config: &Config,
    services: &Services,
    shutdown: CancellationToken,
) -> anyhow::Result<Vec<JoinHandle<()>>> {
    let server = &config.server;
    let ip: IpAddr = server.bind_address.parse()?;
    let idle_timeout = Duration::from_secs(server.tcp_idle_timeout_secs);
    let handler = services.handler.clone();

    let mut tasks = Vec::new();

    let dns_addr = SocketAddr::new(ip, server.dns_port);
    let udp = UdpDnsServer::bind(dns_addr, handler.clone()).await?;
    tasks.push(tokio::spawn(udp.serve(shutdown.clone())));

    let tcp = TcpDnsServer::bind(dns_addr, handler.clone())
        .await?
        .with_idle_timeout(idle_timeout);
    tasks.push(tokio::spawn(tcp.serve(shutdown.clone())));

    info!(bind_address = %dns_addr, "Plain DNS listeners started");

    let tls = match (&server.tls_cert_path, &server.tls_key_path) {
        (Some(cert), Some(key)) => Some(load_tls_acceptor(Path::new(cert), Path::new(key))?),
        _ => None,
    };

    if let Some(port) = server.dot_port {
        let acceptor = tls
            .clone()
            .ok_or_else(|| anyhow::anyhow!("dot_port requires a TLS certificate and key"))?;
        let dot = DotServer::bind(SocketAddr::new(ip, port), acceptor, handler.clone())
            .await?
            .with_idle_timeout(idle_timeout);
        tasks.push(tokio::spawn(dot.serve(shutdown.clone())));
    }

    if let Some(port) = server.doh_port {
        if tls.is_none() {
            warn!(port, "No TLS certificate configured, serving DoH over plain HTTP");
        }
        let state = DohState::new(handler.clone())
            .with_deadline(Duration::from_millis(server.doh_timeout_ms));
        let doh = DohServer::bind(SocketAddr::new(ip, port), state, tls.clone()).await?;
        tasks.push(tokio::spawn(doh.serve(shutdown.clone())));
    }

    Ok(tasks)
}
