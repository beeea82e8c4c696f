#![allow(dead_code)]

use async_trait::async_trait;
use sinkhole_application::ports::{
    ArpReader, ArpTable, ClientHistory, HostnameResolver, MacVendorLookup, NotificationSink,
    QueryLogRepository,
};
use sinkhole_application::services::ClientIdentityCache;
use sinkhole_application::use_cases::ResolveClientIdentityUseCase;
use sinkhole_domain::{DomainError, NotificationSeverity, RequestLogEntry};
use sinkhole_infrastructure::dns::InMemoryClientSettings;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Query log
// ============================================================================

#[derive(Default)]
pub struct CollectingLogRepository {
    entries: Mutex<Vec<RequestLogEntry>>,
    batches: AtomicUsize,
    should_fail: AtomicBool,
}

impl CollectingLogRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    pub fn entries(&self) -> Vec<RequestLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryLogRepository for CollectingLogRepository {
    async fn save_batch(&self, entries: &[RequestLogEntry]) -> Result<(), DomainError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("mock write failure".to_string()));
        }
        self.entries.lock().unwrap().extend_from_slice(entries);
        Ok(())
    }
}

// ============================================================================
// Client history
// ============================================================================

#[derive(Default)]
pub struct StaticClientHistory {
    hostnames: HashMap<IpAddr, String>,
}

impl StaticClientHistory {
    pub fn with(ip: &str, hostname: &str) -> Self {
        let mut hostnames = HashMap::new();
        hostnames.insert(ip.parse().unwrap(), hostname.to_string());
        Self { hostnames }
    }
}

#[async_trait]
impl ClientHistory for StaticClientHistory {
    async fn hostname_for_ip(&self, ip: IpAddr) -> Result<Option<String>, DomainError> {
        Ok(self.hostnames.get(&ip).cloned())
    }
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Default)]
pub struct CollectingNotificationSink {
    notifications: Mutex<Vec<(NotificationSeverity, String, String)>>,
}

impl CollectingNotificationSink {
    pub fn notifications(&self) -> Vec<(NotificationSeverity, String, String)> {
        self.notifications.lock().unwrap().clone()
    }
}

impl NotificationSink for CollectingNotificationSink {
    fn notify(&self, severity: NotificationSeverity, source: &str, message: &str) {
        self.notifications
            .lock()
            .unwrap()
            .push((severity, source.to_string(), message.to_string()));
    }
}

// ============================================================================
// Client identity collaborators that know nothing
// ============================================================================

pub struct EmptyArpReader;

#[async_trait]
impl ArpReader for EmptyArpReader {
    async fn read_arp_table(&self) -> Result<ArpTable, DomainError> {
        Ok(ArpTable::new())
    }
}

pub struct UnknownVendor;

#[async_trait]
impl MacVendorLookup for UnknownVendor {
    async fn vendor_for(&self, _mac: &str) -> Result<Option<String>, DomainError> {
        Ok(None)
    }
}

pub struct NoHostnames;

#[async_trait]
impl HostnameResolver for NoHostnames {
    async fn resolve_hostname(&self, _ip: IpAddr) -> Result<Option<String>, DomainError> {
        Ok(None)
    }
}

pub fn identity_use_case(bypass_clients: &[&str]) -> Arc<ResolveClientIdentityUseCase> {
    Arc::new(ResolveClientIdentityUseCase::new(
        Arc::new(ClientIdentityCache::new()),
        Arc::new(EmptyArpReader),
        Arc::new(UnknownVendor),
        Arc::new(NoHostnames),
        Arc::new(InMemoryClientSettings::new(bypass_clients.iter().copied())),
    ))
}
