//! Shared in-memory session: the current token and user.

use std::sync::Arc;

use courier_core::auth::User;
use tokio::sync::RwLock;

/// Snapshot of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<User>,
}

/// Cloneable handle to one session shared by every client and bloc.
///
/// The persisted token is authoritative; this is the cache requests read
/// their bearer token from.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.inner.read().await.user.clone()
    }

    pub async fn snapshot(&self) -> SessionState {
        self.inner.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.token.is_some()
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        self.inner.write().await.token = Some(token.into());
    }

    pub async fn set_user(&self, user: Option<User>) {
        self.inner.write().await.user = user;
    }

    pub async fn clear(&self) {
        *self.inner.write().await = SessionState::default();
    }
}
