use sinkhole_domain::DomainError;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::ports::ClientSettingsRepository;
use crate::services::ClientIdentityCache;

pub struct ToggleClientBypassUseCase {
    settings: Arc<dyn ClientSettingsRepository>,
    cache: Arc<ClientIdentityCache>,
}

impl ToggleClientBypassUseCase {
    pub fn new(settings: Arc<dyn ClientSettingsRepository>, cache: Arc<ClientIdentityCache>) -> Self {
        Self { settings, cache }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, ip: IpAddr, bypass: bool) -> Result<(), DomainError> {
        self.settings.set_bypass(ip, bypass).await?;
        self.cache.invalidate(&ip);

        info!(client = %ip, bypass, "Client bypass updated");
        Ok(())
    }
}
