use async_trait::async_trait;
use sinkhole_domain::DomainError;

#[async_trait]
pub trait MacVendorLookup: Send + Sync {
    /// Manufacturer name for a MAC address (`aa:bb:cc:dd:ee:ff`).
    async fn vendor_for(&self, mac: &str) -> Result<Option<String>, DomainError>;
}
