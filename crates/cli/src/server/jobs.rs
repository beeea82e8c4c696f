use crate::di::Services;
use sinkhole_domain::Config;
use sinkhole_jobs::{JobRunner, PrefetchRefreshJob};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub async fn start_jobs(
    config: &Config,
    services: &Services,
    shutdown: CancellationToken,
) -> Vec<JoinHandle<()>> {
    let prefetch = PrefetchRefreshJob::new(services.refresher.clone())
        .with_interval(Duration::from_millis(config.prefetch.interval_ms))
        .with_cancellation(shutdown);

    JobRunner::new()
        .with_prefetch_refresh(prefetch)
        .start()
        .await
}
