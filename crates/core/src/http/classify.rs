//! Pure mapping from [`ApiError`] to failure envelopes.
//!
//! Functional Core: no side effects, the same error always yields the same
//! message and status code.

use serde_json::Value;

use super::{ApiError, ApiResponse};

pub const TIMEOUT_MESSAGE: &str = "Request timeout. Please try again.";
pub const CANCELLED_MESSAGE: &str = "Request was cancelled";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your internet connection.";
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Status reported for timeouts.
pub const TIMEOUT_STATUS: u16 = 408;
/// Status reported for cancelled requests (client closed request).
pub const CANCELLED_STATUS: u16 = 499;
/// Status reported when no HTTP exchange happened at all.
pub const NO_RESPONSE_STATUS: u16 = 0;
/// Status reported for local validation failures.
pub const VALIDATION_STATUS: u16 = 500;

/// Fixed message for the status codes the client knows about.
///
/// # Examples
///
/// ```
/// use courier_core::http::status_message;
///
/// assert_eq!(status_message(404), Some("Not found"));
/// assert_eq!(status_message(418), None);
/// ```
pub fn status_message(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Bad request"),
        401 => Some("Unauthorized. Please login again."),
        403 => Some("Forbidden"),
        404 => Some("Not found"),
        500 => Some("Server error. Please try again later."),
        _ => None,
    }
}

/// Convert an error into a failure envelope.
///
/// - `Timeout` -> 408
/// - `BadResponse` -> fixed message for 400/401/403/404/500, otherwise the
///   body's `message` field or the generic message; status passes through
/// - `Cancelled` -> 499
/// - `Connection` -> 0
/// - `Transport` -> generic message, 0
/// - `Validation` -> its own message, 500
/// - `Unexpected` -> its own message, 0
pub fn classify<T>(error: &ApiError) -> ApiResponse<T> {
    match error {
        ApiError::Timeout => ApiResponse::failure(TIMEOUT_MESSAGE, Some(TIMEOUT_STATUS)),
        ApiError::BadResponse { status, body } => {
            let message = match status_message(*status) {
                Some(message) => message.to_string(),
                None => body
                    .as_ref()
                    .and_then(body_message)
                    .unwrap_or(GENERIC_ERROR_MESSAGE)
                    .to_string(),
            };
            ApiResponse::failure(message, Some(*status))
        }
        ApiError::Cancelled => ApiResponse::failure(CANCELLED_MESSAGE, Some(CANCELLED_STATUS)),
        ApiError::Connection(_) => {
            ApiResponse::failure(NETWORK_ERROR_MESSAGE, Some(NO_RESPONSE_STATUS))
        }
        ApiError::Transport(_) => {
            ApiResponse::failure(GENERIC_ERROR_MESSAGE, Some(NO_RESPONSE_STATUS))
        }
        ApiError::Validation(reason) => {
            ApiResponse::failure(reason.clone(), Some(VALIDATION_STATUS))
        }
        ApiError::Unexpected(reason) => {
            ApiResponse::failure(reason.clone(), Some(NO_RESPONSE_STATUS))
        }
    }
}

fn body_message(body: &Value) -> Option<&str> {
    body.get("message").and_then(Value::as_str)
}
