pub mod dns;
pub mod jobs;

pub use dns::start_dns_servers;
pub use jobs::start_jobs;
