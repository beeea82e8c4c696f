pub mod arp_reader;
pub mod hostname_resolver;
pub mod mac_vendor;
pub mod notifications;

pub use arp_reader::LinuxArpReader;
pub use hostname_resolver::PtrHostnameResolver;
pub use mac_vendor::MacVendorsApiLookup;
pub use notifications::TracingNotificationSink;
