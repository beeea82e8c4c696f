mod arp_reader;
mod blacklist;
mod client_history;
mod client_settings;
mod hostname_resolver;
mod local_resolution;
mod mac_vendor;
mod notification;
mod query_log_repository;

pub use arp_reader::{ArpReader, ArpTable};
pub use blacklist::BlacklistPort;
pub use client_history::ClientHistory;
pub use client_settings::ClientSettingsRepository;
pub use hostname_resolver::HostnameResolver;
pub use local_resolution::LocalResolutionPort;
pub use mac_vendor::MacVendorLookup;
pub use notification::NotificationSink;
pub use query_log_repository::QueryLogRepository;
