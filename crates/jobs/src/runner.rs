use crate::PrefetchRefreshJob;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Central orchestrator for all background jobs.
///
/// Use the builder pattern to register jobs, then call `.start()` once.
///
/// # Example
///
/// ```rust,ignore
/// let handles = JobRunner::new()
///     .with_prefetch_refresh(PrefetchRefreshJob::new(refresher).with_cancellation(token))
///     .start()
///     .await;
/// ```
pub struct JobRunner {
    prefetch_refresh: Option<PrefetchRefreshJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            prefetch_refresh: None,
        }
    }

    pub fn with_prefetch_refresh(mut self, job: PrefetchRefreshJob) -> Self {
        self.prefetch_refresh = Some(job);
        self
    }

    /// Start all registered background jobs and return their task handles.
    pub async fn start(self) -> Vec<JoinHandle<()>> {
        info!("Starting background job runner");
        let mut handles = Vec::new();

        if let Some(job) = self.prefetch_refresh {
            handles.push(Arc::new(job).start().await);
        }

        info!(jobs = handles.len(), "All background jobs started");
        handles
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
