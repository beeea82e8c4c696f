use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use super::{
    BlockingConfig, ConfigError, DatabaseConfig, DnsConfig, LoggingConfig, PrefetchConfig,
    ServerConfig,
};

const DEFAULT_CONFIG_PATHS: &[&str] = &["./sinkhole.toml", "/etc/sinkhole/sinkhole.toml"];
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Root configuration, one section per concern.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub blocking: BlockingConfig,

    #[serde(default)]
    pub prefetch: PrefetchConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values passed on the command line; `Some` wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub upstream: Option<String>,
    pub database_url: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from `config_path`, or from the first default path
    /// that exists, falling back to built-in defaults. CLI overrides are
    /// applied last.
    pub fn load(config_path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(path) => Some(path.to_string()),
            None => DEFAULT_CONFIG_PATHS
                .iter()
                .find(|p| Path::new(p).exists())
                .map(|p| p.to_string()),
        };

        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path, source })?;
                Self::from_toml(&content)?
            }
            None => Config::default(),
        };

        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(upstream) = overrides.upstream {
            self.dns.upstream = upstream;
        }
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "bind_address '{}' is not an IP address",
                self.server.bind_address
            )));
        }

        Self::upstream_addr(&self.dns.upstream)?;
        if let Some(ref server) = self.dns.local_dns_server {
            Self::upstream_addr(server)?;
        }

        if (self.server.dot_port.is_some() || self.server.doh_port.is_some())
            && self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some()
        {
            return Err(ConfigError::Validation(
                "tls_cert_path and tls_key_path must be set together".to_string(),
            ));
        }

        if self.server.dot_port.is_some() && !self.server.has_tls() {
            return Err(ConfigError::Validation(
                "dot_port requires tls_cert_path and tls_key_path".to_string(),
            ));
        }

        for record in &self.dns.local_records {
            if record.ip.parse::<IpAddr>().is_err() {
                return Err(ConfigError::Validation(format!(
                    "local record '{}' has invalid ip '{}'",
                    record.hostname, record.ip
                )));
            }
        }

        for domain in &self.prefetch.domains {
            if domain.record_type.parse::<crate::RecordType>().is_err() {
                return Err(ConfigError::Validation(format!(
                    "prefetch domain '{}' has unknown record type '{}'",
                    domain.domain, domain.record_type
                )));
            }
        }

        if self.prefetch.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "prefetch.interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.database.log_batch_size == 0 || self.database.log_queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "log_batch_size and log_queue_capacity must be greater than zero".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown log level '{}'",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Parse an upstream address, defaulting the port to 53.
    pub fn upstream_addr(server: &str) -> Result<SocketAddr, ConfigError> {
        if let Ok(addr) = server.parse::<SocketAddr>() {
            return Ok(addr);
        }
        server
            .parse::<IpAddr>()
            .map(|ip| SocketAddr::new(ip, 53))
            .map_err(|_| {
                ConfigError::Validation(format!("'{}' is not a valid DNS server address", server))
            })
    }
}
