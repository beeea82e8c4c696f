use async_trait::async_trait;
use dashmap::DashSet;
use sinkhole_application::ports::ClientSettingsRepository;
use sinkhole_domain::DomainError;
use std::net::IpAddr;
use tracing::warn;

/// Bypass flags kept in memory, seeded from `[blocking].bypass_clients`.
#[derive(Default)]
pub struct InMemoryClientSettings {
    bypassed: DashSet<IpAddr>,
}

impl InMemoryClientSettings {
    pub fn new<I>(bypass_clients: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let bypassed = DashSet::new();
        for client in bypass_clients {
            match client.as_ref().parse::<IpAddr>() {
                Ok(ip) => {
                    bypassed.insert(ip);
                }
                Err(_) => warn!(client = client.as_ref(), "Ignoring invalid bypass client address"),
            }
        }
        Self { bypassed }
    }
}

#[async_trait]
impl ClientSettingsRepository for InMemoryClientSettings {
    async fn is_bypassed(&self, ip: IpAddr) -> Result<bool, DomainError> {
        Ok(self.bypassed.contains(&ip))
    }

    async fn set_bypass(&self, ip: IpAddr, bypass: bool) -> Result<(), DomainError> {
        if bypass {
            self.bypassed.insert(ip);
        } else {
            self.bypassed.remove(&ip);
        }
        Ok(())
    }
}
