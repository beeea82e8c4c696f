use dashmap::DashMap;
use sinkhole_domain::ClientIdentity;
use std::net::IpAddr;

/// Process-wide memo of resolved client identities, keyed by source IP.
///
/// Entries never expire on their own; they are dropped by `invalidate` (e.g.
/// after a bypass toggle) or `clear`.
#[derive(Default)]
pub struct ClientIdentityCache {
    entries: DashMap<IpAddr, ClientIdentity>,
}

impl ClientIdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ip: &IpAddr) -> Option<ClientIdentity> {
        self.entries.get(ip).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, identity: ClientIdentity) {
        self.entries.insert(identity.ip, identity);
    }

    pub fn invalidate(&self, ip: &IpAddr) -> bool {
        self.entries.remove(ip).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
