#![allow(dead_code)]

use async_trait::async_trait;
use sinkhole_application::ports::{
    ArpReader, ArpTable, ClientSettingsRepository, HostnameResolver, MacVendorLookup,
};
use sinkhole_domain::DomainError;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

// ============================================================================
// Mock ArpReader
// ============================================================================

#[derive(Clone, Default)]
pub struct MockArpReader {
    table: Arc<RwLock<ArpTable>>,
    should_fail: Arc<RwLock<bool>>,
    delay: Arc<RwLock<Duration>>,
    reads: Arc<AtomicUsize>,
}

impl MockArpReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_entry(&self, ip: &str, mac: &str) {
        self.table
            .write()
            .await
            .insert(ip.parse().unwrap(), mac.to_string());
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ArpReader for MockArpReader {
    async fn read_arp_table(&self) -> Result<ArpTable, DomainError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if *self.should_fail.read().await {
            return Err(DomainError::IoError("mock ARP failure".to_string()));
        }
        Ok(self.table.read().await.clone())
    }
}

// ============================================================================
// Mock MacVendorLookup
// ============================================================================

#[derive(Clone, Default)]
pub struct MockMacVendorLookup {
    vendors: Arc<RwLock<HashMap<String, String>>>,
    should_fail: Arc<RwLock<bool>>,
}

impl MockMacVendorLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_vendor(&self, mac: &str, vendor: &str) {
        self.vendors
            .write()
            .await
            .insert(mac.to_string(), vendor.to_string());
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }
}

#[async_trait]
impl MacVendorLookup for MockMacVendorLookup {
    async fn vendor_for(&self, mac: &str) -> Result<Option<String>, DomainError> {
        if *self.should_fail.read().await {
            return Err(DomainError::LookupFailed("mock vendor failure".to_string()));
        }
        Ok(self.vendors.read().await.get(mac).cloned())
    }
}

// ============================================================================
// Mock HostnameResolver
// ============================================================================

#[derive(Clone, Default)]
pub struct MockHostnameResolver {
    hostnames: Arc<RwLock<HashMap<IpAddr, String>>>,
}

impl MockHostnameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_hostname(&self, ip: &str, hostname: &str) {
        self.hostnames
            .write()
            .await
            .insert(ip.parse().unwrap(), hostname.to_string());
    }
}

#[async_trait]
impl HostnameResolver for MockHostnameResolver {
    async fn resolve_hostname(&self, ip: IpAddr) -> Result<Option<String>, DomainError> {
        Ok(self.hostnames.read().await.get(&ip).cloned())
    }
}

// ============================================================================
// Mock ClientSettingsRepository
// ============================================================================

#[derive(Clone, Default)]
pub struct MockClientSettings {
    bypassed: Arc<RwLock<HashSet<IpAddr>>>,
    should_fail: Arc<RwLock<bool>>,
}

impl MockClientSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }
}

#[async_trait]
impl ClientSettingsRepository for MockClientSettings {
    async fn is_bypassed(&self, ip: IpAddr) -> Result<bool, DomainError> {
        if *self.should_fail.read().await {
            return Err(DomainError::DatabaseError("mock settings failure".to_string()));
        }
        Ok(self.bypassed.read().await.contains(&ip))
    }

    async fn set_bypass(&self, ip: IpAddr, bypass: bool) -> Result<(), DomainError> {
        if *self.should_fail.read().await {
            return Err(DomainError::DatabaseError("mock settings failure".to_string()));
        }
        let mut bypassed = self.bypassed.write().await;
        if bypass {
            bypassed.insert(ip);
        } else {
            bypassed.remove(&ip);
        }
        Ok(())
    }
}
