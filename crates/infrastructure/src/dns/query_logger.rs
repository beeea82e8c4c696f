//! Log batching pipeline
//!
//! Resolvers hand finished [`RequestLogEntry`] values to a bounded channel;
//! a single consumer task batches them into the [`QueryLogRepository`].
//!
//! - A resolver waits at most the enqueue timeout for queue space, then drops
//!   the entry with a warning. Resolution is never blocked for longer.
//! - The consumer flushes when the batch reaches its size threshold or when
//!   the flush interval ticks, whichever comes first.
//! - When every sender is dropped the remaining batch is flushed and the
//!   consumer exits.
//! - Persistence errors are logged; the consumer keeps running.

use sinkhole_application::ports::QueryLogRepository;
use sinkhole_domain::RequestLogEntry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

pub struct RequestLogPipeline;

impl RequestLogPipeline {
    pub fn channel(
        capacity: usize,
        enqueue_timeout: Duration,
    ) -> (RequestLogSender, RequestLogConsumer) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let sender = RequestLogSender {
            tx,
            enqueue_timeout,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        let consumer = RequestLogConsumer {
            rx,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        };
        (sender, consumer)
    }
}

#[derive(Clone)]
pub struct RequestLogSender {
    tx: mpsc::Sender<RequestLogEntry>,
    enqueue_timeout: Duration,
    dropped: Arc<AtomicU64>,
}

impl RequestLogSender {
    /// Enqueue `entry`, giving up after the enqueue timeout.
    pub async fn send(&self, entry: RequestLogEntry) -> bool {
        match self.tx.send_timeout(entry, self.enqueue_timeout).await {
            Ok(()) => true,
            Err(mpsc::error::SendTimeoutError::Timeout(entry)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(domain = %entry.domain, dropped, "Request log queue full, dropping entry");
                false
            }
            Err(mpsc::error::SendTimeoutError::Closed(entry)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                error!(domain = %entry.domain, "Request log consumer has stopped");
                false
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub struct RequestLogConsumer {
    rx: mpsc::Receiver<RequestLogEntry>,
    batch_size: usize,
    flush_interval: Duration,
}

impl RequestLogConsumer {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    pub fn start(self, repo: Arc<dyn QueryLogRepository>) -> JoinHandle<u64> {
        tokio::spawn(self.run(repo))
    }

    /// Drain the queue until every sender is gone. Returns the number of
    /// entries handed to the repository.
    pub async fn run(mut self, repo: Arc<dyn QueryLogRepository>) -> u64 {
        info!(
            batch_size = self.batch_size,
            flush_interval_secs = self.flush_interval.as_secs(),
            "Request log consumer started"
        );

        let mut batch: Vec<RequestLogEntry> = Vec::with_capacity(self.batch_size);
        let mut flushed = 0u64;
        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                maybe_entry = self.rx.recv() => match maybe_entry {
                    Some(entry) => {
                        batch.push(entry);
                        if batch.len() >= self.batch_size {
                            flushed += Self::flush(repo.as_ref(), &mut batch).await;
                        }
                    }
                    None => {
                        flushed += Self::flush(repo.as_ref(), &mut batch).await;
                        info!(flushed, "Request log consumer shutting down");
                        return flushed;
                    }
                },
                _ = ticker.tick() => {
                    flushed += Self::flush(repo.as_ref(), &mut batch).await;
                }
            }
        }
    }

    async fn flush(repo: &dyn QueryLogRepository, batch: &mut Vec<RequestLogEntry>) -> u64 {
        if batch.is_empty() {
            return 0;
        }

        let count = batch.len();
        let result = repo.save_batch(batch).await;
        batch.clear();

        match result {
            Ok(()) => {
                debug!(count, "Request log batch flushed");
                count as u64
            }
            Err(e) => {
                error!(error = %e, count, "Failed to persist request log batch");
                0
            }
        }
    }
}
