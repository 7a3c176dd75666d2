//! Keys used in the key-value store.

/// Bearer token of the current session.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Counter demo value, stored as a decimal integer.
pub const COUNTER_VALUE_KEY: &str = "counter_value";

/// Counter demo last update, stored as an RFC 3339 timestamp.
pub const COUNTER_UPDATED_KEY: &str = "counter_last_updated";
