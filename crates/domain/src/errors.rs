use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid DNS message: {0}")]
    InvalidDnsMessage(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Reply already written")]
    ReplyAlreadyWritten,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Lookup failed: {0}")]
    LookupFailed(String),
}
