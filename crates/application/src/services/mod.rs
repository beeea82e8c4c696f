pub mod client_identity_cache;

pub use client_identity_cache::ClientIdentityCache;
