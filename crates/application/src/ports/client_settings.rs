use async_trait::async_trait;
use sinkhole_domain::DomainError;
use std::net::IpAddr;

#[async_trait]
pub trait ClientSettingsRepository: Send + Sync {
    /// Whether queries from `ip` skip the blacklist
    async fn is_bypassed(&self, ip: IpAddr) -> Result<bool, DomainError>;

    async fn set_bypass(&self, ip: IpAddr, bypass: bool) -> Result<(), DomainError>;
}
