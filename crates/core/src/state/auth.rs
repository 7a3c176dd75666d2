use serde::Serialize;

use crate::auth::User;

/// Session state as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    Initial,
    Loading,
    Authenticated { user: User, token: String },
    Unauthenticated,
    /// The server refused to refresh the token; the user has to log in again.
    TokenExpired { message: String },
    Error { message: String },
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Whether this state ends an intent.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Initial | Self::Loading)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::Initial
    }
}
