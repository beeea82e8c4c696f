use dashmap::DashMap;
use sinkhole_domain::ClientIdentity;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::ports::{ArpReader, ClientSettingsRepository, HostnameResolver, MacVendorLookup};
use crate::services::ClientIdentityCache;

/// Use case: work out who sent a query.
///
/// Every enrichment step is best effort. A failing ARP read, vendor lookup,
/// reverse lookup or settings read leaves that field unknown and the rest of
/// the identity is still resolved and cached.
///
/// Concurrent first lookups for the same address share one resolution.
pub struct ResolveClientIdentityUseCase {
    cache: Arc<ClientIdentityCache>,
    arp_reader: Arc<dyn ArpReader>,
    vendor_lookup: Arc<dyn MacVendorLookup>,
    hostname_resolver: Arc<dyn HostnameResolver>,
    settings: Arc<dyn ClientSettingsRepository>,
    in_flight: DashMap<IpAddr, Arc<OnceCell<ClientIdentity>>>,
}

impl ResolveClientIdentityUseCase {
    pub fn new(
        cache: Arc<ClientIdentityCache>,
        arp_reader: Arc<dyn ArpReader>,
        vendor_lookup: Arc<dyn MacVendorLookup>,
        hostname_resolver: Arc<dyn HostnameResolver>,
        settings: Arc<dyn ClientSettingsRepository>,
    ) -> Self {
        Self {
            cache,
            arp_reader,
            vendor_lookup,
            hostname_resolver,
            settings,
            in_flight: DashMap::new(),
        }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, ip: IpAddr) -> ClientIdentity {
        if let Some(identity) = self.cache.get(&ip) {
            return identity;
        }

        let cell = self.in_flight.entry(ip).or_default().value().clone();
        let identity = cell.get_or_init(|| self.resolve(ip)).await.clone();
        self.in_flight.remove_if(&ip, |_, current| Arc::ptr_eq(current, &cell));
        identity
    }

    async fn resolve(&self, ip: IpAddr) -> ClientIdentity {
        if let Some(identity) = self.cache.get(&ip) {
            return identity;
        }

        let mut identity = ClientIdentity::unknown(ip);

        identity.mac = match self.arp_reader.read_arp_table().await {
            Ok(table) => table.get(&ip).map(|mac| Arc::from(mac.as_str())),
            Err(e) => {
                debug!(error = %e, "ARP table unavailable");
                None
            }
        };

        if let Some(ref mac) = identity.mac {
            identity.vendor = match self.vendor_lookup.vendor_for(mac).await {
                Ok(vendor) => vendor.map(|v| Arc::from(v.as_str())),
                Err(e) => {
                    debug!(mac = %mac, error = %e, "MAC vendor lookup failed");
                    None
                }
            };
        }

        identity.hostname = self.hostname_for(ip).await.map(|h| Arc::from(h.as_str()));

        identity.bypass = match self.settings.is_bypassed(ip).await {
            Ok(bypass) => bypass,
            Err(e) => {
                debug!(error = %e, "Client settings unavailable");
                false
            }
        };

        debug!(
            hostname = ?identity.hostname,
            mac = ?identity.mac,
            vendor = ?identity.vendor,
            bypass = identity.bypass,
            "Client identity resolved"
        );

        self.cache.insert(identity.clone());
        identity
    }

    async fn hostname_for(&self, ip: IpAddr) -> Option<String> {
        if ip.is_loopback() {
            return hostname::get()
                .ok()
                .and_then(|name| name.into_string().ok());
        }

        match self.hostname_resolver.resolve_hostname(ip).await {
            Ok(hostname) => hostname,
            Err(e) => {
                debug!(error = %e, "Reverse lookup for client failed");
                None
            }
        }
    }
}
