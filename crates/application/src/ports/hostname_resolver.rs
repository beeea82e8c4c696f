use async_trait::async_trait;
use sinkhole_domain::DomainError;
use std::net::IpAddr;

#[async_trait]
pub trait HostnameResolver: Send + Sync {
    /// Reverse lookup for a client address. `Ok(None)` when nothing answers.
    async fn resolve_hostname(&self, ip: IpAddr) -> Result<Option<String>, DomainError>;
}
