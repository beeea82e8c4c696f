//! Dependency wiring: builds every shared component once and hands out
//! `Arc`s. Nothing here is a global.

pub mod dns;
pub mod repositories;

use sinkhole_domain::Config;
use sinkhole_infrastructure::dns::{DnsServerHandler, PrefetchRefresher};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub use repositories::Repositories;

pub struct Services {
    pub handler: Arc<DnsServerHandler>,
    pub refresher: Arc<PrefetchRefresher>,
    log_consumer: JoinHandle<u64>,
}

impl Services {
    pub fn build(config: &Config, pool: SqlitePool) -> anyhow::Result<Self> {
        let repos = Repositories::new(config, pool);
        let upstreams = dns::Upstreams::from_config(config)?;
        let pipeline = dns::build_pipeline(config, &repos, &upstreams);
        let identities = dns::build_identity_use_case(&repos, &upstreams)?;
        let (log, log_consumer) = dns::start_request_log(config, &repos);
        let refresher = dns::build_refresher(config, pipeline.clone())?;

        let handler = Arc::new(DnsServerHandler::new(pipeline.clone(), identities, log));

        Ok(Self {
            handler,
            refresher,
            log_consumer,
        })
    }

    /// Drop every log sender held here and return the consumer task, which
    /// finishes after its final flush.
    pub fn into_log_consumer(self) -> JoinHandle<u64> {
        self.log_consumer
    }
}
