//! Live feeds of processed queries
//!
//! Optional broadcast channels a dashboard or tail command can subscribe to.
//! Disabled by default: emitting on a disabled feed, or on an enabled feed
//! with no subscribers, is a no-op.

pub mod emitter;
pub mod types;

pub use emitter::LiveFeed;
pub use types::ClientActivity;
