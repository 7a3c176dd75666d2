//! Pretty output formatting.

use courier_core::auth::User;
use courier_core::state::{AuthState, CounterState, CounterStatus, ViewState};
use courier_core::ApiResponse;
use serde_json::Value;

use crate::bloc::Transfer;

/// Format a user for display.
pub fn format_user(user: &User) -> String {
    let mut output = format!("{}\n  ID: {}\n  Email: {}", user.display_name(), user.id, user.email);
    if let Some(phone) = &user.phone {
        output.push_str(&format!("\n  Phone: {}", phone));
    }
    if let Some(avatar) = &user.avatar {
        output.push_str(&format!("\n  Avatar: {}", avatar));
    }
    if let Some(created_at) = &user.created_at {
        output.push_str(&format!("\n  Created: {}", created_at.format("%Y-%m-%d %H:%M")));
    }
    output
}

/// Format users for display.
pub fn format_users(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found.".to_string();
    }
    let mut output = format!("USERS ({})\n", users.len());
    output.push_str(&"-".repeat(40));
    for user in users {
        output.push_str(&format!("\n{}", format_user(user)));
        output.push('\n');
    }
    output
}

pub fn format_auth_state(state: &AuthState) -> String {
    match state {
        AuthState::Initial => "Not started.".to_string(),
        AuthState::Loading => "Working...".to_string(),
        AuthState::Authenticated { user, .. } => {
            format!("Signed in as:\n{}", format_user(user))
        }
        AuthState::Unauthenticated => "Not signed in.".to_string(),
        AuthState::TokenExpired { message } => format!("Session expired: {}", message),
        AuthState::Error { message } => format!("Error: {}", message),
    }
}

/// Format any view state, rendering the payload with `data`.
pub fn format_view_state<T>(state: &ViewState<T>, data: impl Fn(&T) -> String) -> String {
    match state {
        ViewState::Initial => "Idle.".to_string(),
        ViewState::Loading => "Working...".to_string(),
        ViewState::Progress { ratio } => format_progress(*ratio),
        ViewState::Success { data: payload, message } => match message {
            Some(message) => format!("{}\n{}", message, data(payload)),
            None => data(payload),
        },
        ViewState::Error { message } => format!("Error: {}", message),
    }
}

/// A 20 cell progress bar with a percentage.
pub fn format_progress(ratio: f64) -> String {
    let ratio = ratio.clamp(0.0, 1.0);
    let filled = (ratio * 20.0).round() as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        " ".repeat(20 - filled),
        (ratio * 100.0).round() as u32
    )
}

pub fn format_transfer(transfer: &Transfer) -> String {
    match transfer {
        Transfer::Uploaded { files } => {
            let mut output = format!("FILES ({})", files.len());
            for file in files {
                output.push_str(&format!("\n  {}", file.id));
                if let Some(name) = &file.name {
                    output.push_str(&format!("  {}", name));
                }
                if let Some(url) = &file.url {
                    output.push_str(&format!("  {}", url));
                }
            }
            output
        }
        Transfer::Downloaded { path } => format!("Saved to {}", path),
    }
}

pub fn format_counter(state: &CounterState) -> String {
    let mut output = format!("Counter: {}", state.value);
    if let Some(updated) = &state.last_updated {
        output.push_str(&format!("\n  Last updated: {}", updated.to_rfc3339()));
    }
    match &state.status {
        CounterStatus::Idle => {}
        CounterStatus::Loading => output.push_str("\n  Loading..."),
        CounterStatus::Error(message) => output.push_str(&format!("\n  Error: {}", message)),
    }
    output
}

/// Status line followed by the pretty-printed payload.
pub fn format_envelope(response: &ApiResponse<Value>) -> String {
    let status = response
        .status_code()
        .map(|code| code.to_string())
        .unwrap_or_else(|| "-".to_string());
    let outcome = if response.is_success() { "OK" } else { "FAILED" };
    let mut output = format!("{} {}", outcome, status);
    if let Some(message) = response.message() {
        output.push_str(&format!(" - {}", message));
    }
    if let Some(data) = response.data() {
        output.push('\n');
        output.push_str(&serde_json::to_string_pretty(data).unwrap_or_default());
    }
    output
}
