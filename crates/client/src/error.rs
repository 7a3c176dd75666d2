//! Client error types.
//!
//! Request failures never surface here: they are folded into an
//! [`ApiResponse`](courier_core::ApiResponse). These errors cover client setup
//! and the bloc runtime.

use thiserror::Error;

/// Result type alias for client module.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur outside of a request/response exchange.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP client setup failed: {0}")]
    Setup(#[from] reqwest::Error),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Bloc is closed")]
    BlocClosed,
}
