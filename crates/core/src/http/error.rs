use serde_json::Value;
use thiserror::Error;

/// Everything that can go wrong between building a request and reading its
/// response. The classifier turns each variant into a failure envelope.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// Connect, send or receive timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status.
    #[error("server returned {status}")]
    BadResponse { status: u16, body: Option<Value> },

    #[error("request was cancelled")]
    Cancelled,

    /// No route, DNS failure or refused connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// Any other failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// Pre-flight validation failed locally; nothing was sent.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unexpected(String),
}

impl ApiError {
    /// Status code of a `BadResponse`, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::Unexpected(error.to_string())
    }
}
