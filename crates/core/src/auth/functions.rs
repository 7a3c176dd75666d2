use serde_json::Value;

use super::User;

/// Pull the bearer token out of a credential response.
///
/// Accepts `{ "token": .. }`, `{ "access_token": .. }` and the same keys
/// nested under `data`.
pub fn extract_token(body: &Value) -> Option<String> {
    fn direct(value: &Value) -> Option<String> {
        ["token", "access_token", "accessToken"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str))
            .filter(|token| !token.is_empty())
            .map(String::from)
    }

    direct(body).or_else(|| body.get("data").and_then(direct))
}

/// Pull an embedded user object out of a credential response.
pub fn extract_user(body: &Value) -> Option<User> {
    let candidate = body
        .get("user")
        .or_else(|| body.get("data").and_then(|data| data.get("user")))?;
    if !candidate.is_object() {
        return None;
    }
    serde_json::from_value(candidate.clone()).ok()
}

/// User to report when the profile fetch after a credential exchange fails.
///
/// The user embedded in the credential response wins; otherwise a minimal
/// record is built from what the caller submitted.
pub fn fallback_user(body: Option<&Value>, email: &str, name: Option<&str>) -> User {
    if let Some(user) = body.and_then(extract_user) {
        return user;
    }
    let name = match name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => email_to_name(email),
    };
    User::local(email, name)
}

/// Extract username from email if no name provided.
pub fn email_to_name(email: &str) -> String {
    match email.split('@').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "User".to_string(),
    }
}
