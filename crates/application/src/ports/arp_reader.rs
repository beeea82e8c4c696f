use async_trait::async_trait;
use sinkhole_domain::DomainError;
use std::collections::HashMap;
use std::net::IpAddr;

/// IP address → MAC address, as reported by the kernel neighbour table.
pub type ArpTable = HashMap<IpAddr, String>;

#[async_trait]
pub trait ArpReader: Send + Sync {
    async fn read_arp_table(&self) -> Result<ArpTable, DomainError>;
}
