//! The uniform success/failure wrapper returned by every API operation.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{classify, ApiError};

/// Response headers, lower-cased names.
pub type Headers = BTreeMap<String, String>;

/// Result of one API call.
///
/// Only [`ApiResponse::success`] produces an envelope with `is_success() ==
/// true`; the payload may still be absent for endpoints without a body.
/// Envelopes are never mutated, every combinator consumes and rebuilds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    data: Option<T>,
    message: Option<String>,
    status_code: Option<u16>,
    headers: Option<Headers>,
    is_success: bool,
}

impl<T> ApiResponse<T> {
    /// Build a success envelope.
    pub fn success(
        data: Option<T>,
        message: Option<String>,
        status_code: Option<u16>,
        headers: Option<Headers>,
    ) -> Self {
        Self {
            data,
            message,
            status_code,
            headers,
            is_success: true,
        }
    }

    /// Build a failure envelope.
    pub fn failure(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
            status_code,
            headers: None,
            is_success: false,
        }
    }

    /// Build a failure envelope that keeps the raw error payload around.
    pub fn failure_with_data(message: impl Into<String>, status_code: Option<u16>, data: T) -> Self {
        Self {
            data: Some(data),
            message: Some(message.into()),
            status_code,
            headers: None,
            is_success: false,
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    /// Look up a response header by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(&name))
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        self.is_success
    }

    /// Message to show a user: the envelope's own message, else `fallback`.
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(fallback)
    }

    /// Transform the payload, keeping everything else.
    pub fn map<U, F>(self, f: F) -> ApiResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        ApiResponse {
            data: self.data.map(f),
            message: self.message,
            status_code: self.status_code,
            headers: self.headers,
            is_success: self.is_success,
        }
    }

    /// Run a fallible parser over the payload of a successful envelope.
    ///
    /// A parser error turns the envelope into a classified failure. Failure
    /// envelopes pass through with their payload dropped.
    pub fn and_then_parse<U, F>(self, parser: F) -> ApiResponse<U>
    where
        F: FnOnce(T) -> Result<U, ApiError>,
    {
        if !self.is_success {
            return ApiResponse {
                data: None,
                message: self.message,
                status_code: self.status_code,
                headers: self.headers,
                is_success: false,
            };
        }

        match self.data {
            None => ApiResponse {
                data: None,
                message: self.message,
                status_code: self.status_code,
                headers: self.headers,
                is_success: true,
            },
            Some(data) => match parser(data) {
                Ok(parsed) => ApiResponse {
                    data: Some(parsed),
                    message: self.message,
                    status_code: self.status_code,
                    headers: self.headers,
                    is_success: true,
                },
                Err(error) => classify(&error),
            },
        }
    }

    /// Convert into a `Result`, losing the metadata.
    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.is_success {
            Ok(self.data)
        } else {
            Err(self
                .message
                .unwrap_or_else(|| super::GENERIC_ERROR_MESSAGE.to_string()))
        }
    }
}

impl ApiResponse<Value> {
    /// Decode the JSON payload into a typed record.
    pub fn decode<U: DeserializeOwned>(self) -> ApiResponse<U> {
        self.and_then_parse(|value| serde_json::from_value(value).map_err(ApiError::from))
    }

    /// Decode a payload that may be wrapped as `{ "data": ... }`.
    pub fn decode_unwrapped<U: DeserializeOwned>(self) -> ApiResponse<U> {
        self.and_then_parse(|value| {
            serde_json::from_value(unwrap_data(value)).map_err(ApiError::from)
        })
    }

    /// The `message` field of the JSON payload, if the server sent one.
    pub fn body_message(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|value| value.get("message"))
            .and_then(Value::as_str)
    }
}

/// Strip a `{ "data": ... }` wrapper if the payload has one.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
