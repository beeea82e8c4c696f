use async_trait::async_trait;
use sinkhole_domain::{DomainError, RequestLogEntry};

#[async_trait]
pub trait QueryLogRepository: Send + Sync {
    /// Persist a batch of log entries in a single write.
    async fn save_batch(&self, entries: &[RequestLogEntry]) -> Result<(), DomainError>;
}
