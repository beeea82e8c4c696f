pub mod blacklist;
pub mod cache;
pub mod client_settings;
pub mod events;
pub mod forwarding;
pub mod local_records;
pub mod pipeline;
pub mod prefetch;
pub mod query_logger;
pub mod server;
pub mod transport;
pub mod upstream;

pub use blacklist::InMemoryBlacklist;
pub use cache::{CacheMetrics, CachedAnswer, CachedRecord, DnsCache};
pub use client_settings::InMemoryClientSettings;
pub use events::{ClientActivity, LiveFeed};
pub use local_records::LocalRecordsResolver;
pub use pipeline::{BlockingPause, Resolution, ResolutionPipeline};
pub use prefetch::{PrefetchRefresher, RefreshReport};
pub use query_logger::{RequestLogConsumer, RequestLogPipeline, RequestLogSender};
pub use server::{DnsServerHandler, ReplyWriter, Request};
pub use upstream::{ForwardingExchanger, UpstreamAnswer, UpstreamExchanger};
