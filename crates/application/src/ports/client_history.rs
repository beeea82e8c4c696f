use async_trait::async_trait;
use sinkhole_domain::DomainError;
use std::net::IpAddr;

#[async_trait]
pub trait ClientHistory: Send + Sync {
    /// Most recently recorded hostname for a client address.
    async fn hostname_for_ip(&self, ip: IpAddr) -> Result<Option<String>, DomainError>;
}
