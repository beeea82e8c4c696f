//! Configuration module for Sinkhole DNS
//!
//! This module contains all configuration structures organized by domain:
//! - `root`: Main configuration and CLI overrides
//! - `server`: Listener ports, binding and TLS material
//! - `dns`: Upstream forwarding, TTLs and local records
//! - `blocking`: Sinkhole lists and bypassing clients
//! - `prefetch`: Prefetch refresher tick and registered domains
//! - `database`: Query log storage and batching
//! - `logging`: Logging settings
//! - `errors`: Configuration errors

pub mod blocking;
pub mod database;
pub mod dns;
pub mod errors;
pub mod local_records;
pub mod logging;
pub mod prefetch;
pub mod root;
pub mod server;

pub use blocking::BlockingConfig;
pub use database::DatabaseConfig;
pub use dns::DnsConfig;
pub use errors::ConfigError;
pub use local_records::LocalDnsRecord;
pub use logging::LoggingConfig;
pub use prefetch::{PrefetchConfig, PrefetchDomainConfig};
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
