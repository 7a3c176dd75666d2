//! Pure construction of request headers.

use std::collections::BTreeMap;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT: &str = "Accept";
pub const AUTHORIZATION: &str = "Authorization";
pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Format a bearer token as an `Authorization` header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Merge default, caller and auth headers.
///
/// Defaults are JSON content type and accept. Caller headers replace a
/// default with the same name (compared case-insensitively). When
/// `requires_auth` is set and a token is known the bearer header is added
/// last, so it always wins.
pub fn build_headers(
    caller: Option<&BTreeMap<String, String>>,
    token: Option<&str>,
    requires_auth: bool,
) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
    headers.insert(ACCEPT.to_string(), APPLICATION_JSON.to_string());

    if let Some(caller) = caller {
        for (name, value) in caller {
            set_header(&mut headers, name, value);
        }
    }

    if requires_auth {
        if let Some(token) = token {
            set_header(&mut headers, AUTHORIZATION, &bearer(token));
        }
    }

    headers
}

/// Insert a header, replacing any existing one that differs only in case.
pub fn set_header(headers: &mut BTreeMap<String, String>, name: &str, value: &str) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.to_string());
}

/// Drop a header regardless of case.
pub fn remove_header(headers: &mut BTreeMap<String, String>, name: &str) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
}
