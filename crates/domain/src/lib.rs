//! Sinkhole DNS Domain Layer
pub mod client;
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod errors;
pub mod notification;
pub mod prefetch;
pub mod query_log;

pub use client::ClientIdentity;
pub use config::{CliOverrides, Config, ConfigError};
pub use dns_query::DnsQuery;
pub use dns_record::RecordType;
pub use errors::DomainError;
pub use notification::NotificationSeverity;
pub use prefetch::PrefetchedDomain;
pub use query_log::{Protocol, RequestLogEntry};
