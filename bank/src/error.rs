use std::io;

use spawned_concurrency::tasks::GenServerError;
use thiserror::Error;

/// Failures turning bytes into messages or messages into bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Empty, not UTF-8 or not JSON. Nothing can be said back about it.
    #[error("unreadable datagram: {0}")]
    Unreadable(String),
    /// JSON, but not shaped like the expected message.
    #[error("{0}")]
    Malformed(String),
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u64),
    #[error("encoded message is {size} bytes, limit is {limit}")]
    Oversized { size: usize, limit: usize },
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CodecError {
    /// Whether the peer should get a failure response rather than silence.
    pub fn is_answerable(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::UnsupportedVersion(_))
    }
}

/// Reasons a decoded request cannot be turned into a bank call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing amount argument for {0}")]
    MissingArgument(&'static str),
    #[error("invalid amount '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("bank service unavailable")]
    Unavailable,
}

// A dead mailbox, a dropped reply or a failed callback all leave the caller
// without an outcome.
impl From<GenServerError> for ServiceError {
    fn from(_value: GenServerError) -> Self {
        Self::Unavailable
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("no reply within {0:?}")]
    Timeout(std::time::Duration),
    #[error("usage: {0}")]
    Usage(String),
}
