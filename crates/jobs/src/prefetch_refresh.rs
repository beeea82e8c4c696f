use sinkhole_infrastructure::dns::PrefetchRefresher;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const DEFAULT_PREFETCH_INTERVAL: Duration = Duration::from_millis(500);

/// Drives `PrefetchRefresher::tick` on a fixed interval.
///
/// Ticks run one after another on a single task; a slow tick delays the next
/// one instead of overlapping it.
pub struct PrefetchRefreshJob {
    refresher: Arc<PrefetchRefresher>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl PrefetchRefreshJob {
    pub fn new(refresher: Arc<PrefetchRefresher>) -> Self {
        Self {
            refresher,
            interval: DEFAULT_PREFETCH_INTERVAL,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Starting prefetch refresh job"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("PrefetchRefreshJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let report = self.refresher.tick().await;
                        debug!(
                            prefetched = report.prefetched,
                            refreshed = report.refreshed,
                            evicted = report.evicted,
                            failed = report.failed,
                            "Prefetch tick"
                        );
                    }
                }
            }
        })
    }
}
