//! # Sinkhole DNS
//!
//! Forwarding resolver with ad sinkholing, served over UDP, TCP, DoT and DoH.

mod bootstrap;
mod di;
mod server;

use clap::Parser;
use sinkhole_domain::CliOverrides;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "sinkhole")]
#[command(version)]
#[command(about = "Forwarding DNS resolver with ad sinkholing")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// DNS server port (UDP and TCP)
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Upstream resolver, e.g. 9.9.9.9:53
    #[arg(short = 'u', long)]
    upstream: Option<String>,

    /// SQLite URL for the query log
    #[arg(long)]
    database: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,
}

impl From<&Cli> for CliOverrides {
    fn from(cli: &Cli) -> Self {
        Self {
            dns_port: cli.dns_port,
            bind_address: cli.bind.clone(),
            upstream: cli.upstream.clone(),
            database_url: cli.database.clone(),
            log_level: cli.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(cli.config.as_deref(), CliOverrides::from(&cli))?;
    bootstrap::init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = cli.config.as_deref().unwrap_or("default"),
        dns_port = config.server.dns_port,
        bind = %config.server.bind_address,
        upstream = %config.dns.upstream,
        "Sinkhole DNS starting"
    );

    let pool = bootstrap::init_database(&config.database.url).await?;
    let services = di::Services::build(&config, pool)?;

    let shutdown = CancellationToken::new();
    let mut tasks = server::start_dns_servers(&config, &services, shutdown.clone()).await?;
    tasks.extend(server::start_jobs(&config, &services, shutdown.clone()).await);

    info!("Server ready, press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }

    info!("Shutting down");
    shutdown.cancel();
    futures::future::join_all(tasks).await;

    match services.into_log_consumer().await {
        Ok(written) => info!(written, "Query log flushed"),
        Err(e) => error!(error = %e, "Query log consumer failed"),
    }

    Ok(())
}
