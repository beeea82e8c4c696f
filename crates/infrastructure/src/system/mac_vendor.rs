use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::StatusCode;
use sinkhole_application::ports::MacVendorLookup;
use sinkhole_domain::DomainError;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.macvendors.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Vendor lookup through api.macvendors.com, memoized per OUI.
///
/// Both hits and "unknown vendor" answers are remembered; rate limiting and
/// transport failures are not, so the next client from that OUI retries.
pub struct MacVendorsApiLookup {
    client: reqwest::Client,
    base_url: String,
    by_oui: DashMap<String, Option<String>>,
}

impl MacVendorsApiLookup {
    pub fn new() -> Result<Self, DomainError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DomainError::TransportError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            by_oui: DashMap::new(),
        })
    }

    /// First three octets, upper-cased and colon separated.
    pub fn oui(mac: &str) -> Option<String> {
        let octets: Vec<String> = mac
            .split([':', '-'])
            .take(3)
            .map(str::to_ascii_uppercase)
            .collect();

        let valid = octets.len() == 3
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

        valid.then(|| octets.join(":"))
    }

    pub fn cached_ouis(&self) -> usize {
        self.by_oui.len()
    }

    async fn fetch(&self, oui: &str) -> Result<Option<String>, DomainError> {
        let url = format!("{}/{}", self.base_url, oui);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DomainError::LookupFailed(format!("MAC vendor request: {}", e)))?;

        match response.status() {
            StatusCode::OK => {
                let vendor = response
                    .text()
                    .await
                    .map_err(|e| DomainError::LookupFailed(format!("MAC vendor body: {}", e)))?;
                let vendor = vendor.trim();
                Ok((!vendor.is_empty()).then(|| vendor.to_string()))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(DomainError::LookupFailed(format!(
                "MAC vendor lookup returned {}",
                status
            ))),
        }
    }
}

#[async_trait]
impl MacVendorLookup for MacVendorsApiLookup {
    async fn vendor_for(&self, mac: &str) -> Result<Option<String>, DomainError> {
        let oui = Self::oui(mac)
            .ok_or_else(|| DomainError::LookupFailed(format!("Invalid MAC address: {}", mac)))?;

        if let Some(vendor) = self.by_oui.get(&oui) {
            return Ok(vendor.clone());
        }

        let vendor = self.fetch(&oui).await?;
        debug!(oui = %oui, vendor = ?vendor, "MAC vendor resolved");
        self.by_oui.insert(oui, vendor.clone());
        Ok(vendor)
    }
}
