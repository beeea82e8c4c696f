use super::Repositories;
use sinkhole_application::services::ClientIdentityCache;
use sinkhole_application::use_cases::ResolveClientIdentityUseCase;
use sinkhole_domain::{Config, PrefetchedDomain, RecordType};
use sinkhole_infrastructure::dns::{
    DnsCache, ForwardingExchanger, InMemoryBlacklist, LocalRecordsResolver, PrefetchRefresher,
    RequestLogPipeline, RequestLogSender, ResolutionPipeline, UpstreamExchanger,
};
use sinkhole_infrastructure::system::{
    LinuxArpReader, MacVendorsApiLookup, PtrHostnameResolver, TracingNotificationSink,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

pub struct Upstreams {
    pub preferred: Arc<dyn UpstreamExchanger>,
    pub local_dns: Option<Arc<dyn UpstreamExchanger>>,
}

impl Upstreams {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(config.dns.query_timeout);
        let upstream_addr = Config::upstream_addr(&config.dns.upstream)?;

        let preferred: Arc<dyn UpstreamExchanger> = Arc::new(
            ForwardingExchanger::new(upstream_addr, timeout, config.dns.default_ttl)
                .with_notifications(Arc::new(TracingNotificationSink)),
        );

        let local_dns = match config.dns.local_dns_server {
            Some(ref server) => {
                let addr = Config::upstream_addr(server)?;
                info!(server = %addr, "Local DNS server configured for private PTR lookups");
                Some(Arc::new(ForwardingExchanger::new(addr, timeout, config.dns.default_ttl))
                    as Arc<dyn UpstreamExchanger>)
            }
            None => None,
        };

        info!(upstream = %upstream_addr, timeout_ms = config.dns.query_timeout, "Upstream configured");

        Ok(Self {
            preferred,
            local_dns,
        })
    }
}

pub fn build_pipeline(
    config: &Config,
    repos: &Repositories,
    upstreams: &Upstreams,
) -> Arc<ResolutionPipeline> {
    let blacklist = InMemoryBlacklist::new(
        &config.blocking.custom_blocked,
        &config.blocking.whitelist,
    );
    let local_records = LocalRecordsResolver::new(&config.dns.local_records);

    info!(
        blocked = config.blocking.custom_blocked.len(),
        whitelisted = config.blocking.whitelist.len(),
        local_records = config.dns.local_records.len(),
        blocking_enabled = config.blocking.enabled,
        "Resolution pipeline configured"
    );

    Arc::new(
        ResolutionPipeline::new(
            Arc::new(DnsCache::new()),
            upstreams.preferred.clone(),
            Arc::new(blacklist),
            Arc::new(local_records),
        )
        .with_client_history(repos.query_log.clone())
        .with_local_dns(upstreams.local_dns.clone())
        .with_blocking_enabled(config.blocking.enabled)
        .with_local_ttl(config.dns.local_ttl),
    )
}

pub fn build_identity_use_case(
    repos: &Repositories,
    upstreams: &Upstreams,
) -> anyhow::Result<Arc<ResolveClientIdentityUseCase>> {
    let hostnames = PtrHostnameResolver::new(upstreams.preferred.clone())
        .with_local_dns(upstreams.local_dns.clone());

    Ok(Arc::new(ResolveClientIdentityUseCase::new(
        Arc::new(ClientIdentityCache::new()),
        Arc::new(LinuxArpReader::new()),
        Arc::new(MacVendorsApiLookup::new()?),
        Arc::new(hostnames),
        repos.client_settings.clone(),
    )))
}

pub fn start_request_log(
    config: &Config,
    repos: &Repositories,
) -> (RequestLogSender, JoinHandle<u64>) {
    let db = &config.database;
    let (sender, consumer) = RequestLogPipeline::channel(
        db.log_queue_capacity,
        Duration::from_millis(db.log_enqueue_timeout_ms),
    );

    let consumer = consumer
        .with_batch_size(db.log_batch_size)
        .with_flush_interval(Duration::from_secs(db.log_flush_interval_secs));

    info!(
        batch_size = db.log_batch_size,
        flush_interval_secs = db.log_flush_interval_secs,
        queue_capacity = db.log_queue_capacity,
        "Request log pipeline started"
    );

    (sender, consumer.start(repos.query_log.clone()))
}

pub fn build_refresher(
    config: &Config,
    pipeline: Arc<ResolutionPipeline>,
) -> anyhow::Result<Arc<PrefetchRefresher>> {
    let mut domains = Vec::with_capacity(config.prefetch.domains.len());
    for entry in &config.prefetch.domains {
        let record_type = entry
            .record_type
            .parse::<RecordType>()
            .map_err(anyhow::Error::msg)?;
        domains.push(PrefetchedDomain::new(
            &entry.domain,
            record_type,
            entry.refresh_secs,
        ));
    }

    info!(domains = domains.len(), "Prefetch refresher configured");
    Ok(Arc::new(PrefetchRefresher::new(pipeline).with_domains(domains)))
}
