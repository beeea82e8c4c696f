//! Inbound transports
//!
//! Every listener turns raw bytes into a [`Request`] carrying a
//! [`ReplyWriter`] for its transport, so the resolution pipeline never sees
//! sockets or HTTP types.

pub mod handler;
pub mod https;
pub mod request;
pub mod tcp;
pub mod tls;
pub mod udp;
pub mod writer;

pub use handler::DnsServerHandler;
pub use https::{DohServer, DohState, DNS_MESSAGE_CONTENT_TYPE, DOH_PATH, MAX_DOH_MESSAGE_SIZE};
pub use request::Request;
pub use tcp::{TcpDnsServer, STREAM_IDLE_TIMEOUT};
pub use tls::{load_tls_acceptor, DotServer};
pub use udp::UdpDnsServer;
pub use writer::{
    DohReplyWriter, NoopReplyWriter, ReplyWriter, StreamReplyWriter, UdpReplyWriter,
    MAX_UDP_REPLY_SIZE, MIN_UDP_REPLY_SIZE,
};
