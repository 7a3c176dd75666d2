//! Token lifecycle: login, register, refresh, logout, startup restore.

use std::sync::Arc;

use courier_core::auth::{extract_token, extract_user, LoginRequest, RefreshOutcome, RegisterRequest, User};
use courier_core::config::endpoints;
use courier_core::storage::keys::AUTH_TOKEN_KEY;
use courier_core::{classify, ApiError, ApiResponse, KeyValueStore, RequestDescriptor, StoreError};
use serde_json::Value;

use crate::client::ApiClient;

/// Message reported when a refresh fails for any reason.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";

/// Manages the bearer token across the persisted store and the session.
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
}

impl AuthClient {
    pub fn new(api: ApiClient, store: Arc<dyn KeyValueStore>) -> Self {
        Self { api, store }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Exchange credentials for a token.
    pub async fn login(&self, email: &str, password: &str) -> ApiResponse<Value> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.exchange(endpoints::LOGIN, &request).await
    }

    /// Create an account and sign in with it.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResponse<Value> {
        self.exchange(endpoints::REGISTER, request).await
    }

    /// Ask for a new token with the current one.
    ///
    /// Any failure clears the session, so the caller only has to route the
    /// user back to login.
    pub async fn refresh(&self) -> RefreshOutcome {
        let descriptor = RequestDescriptor::post(endpoints::REFRESH)
            .authenticated()
            .build();
        let response = self.api.execute(&descriptor).await;

        let token = response
            .is_success()
            .then(|| response.data().and_then(extract_token))
            .flatten();

        match token {
            Some(token) => {
                self.persist_token(&token).await;
                self.api.session().set_token(token.clone()).await;
                tracing::info!("token refreshed");
                RefreshOutcome::Refreshed { token }
            }
            None => {
                tracing::warn!(
                    status = ?response.status_code(),
                    "token refresh failed, clearing session"
                );
                self.logout().await;
                RefreshOutcome::Expired {
                    message: SESSION_EXPIRED_MESSAGE.to_string(),
                }
            }
        }
    }

    /// Best-effort remote logout, then forget the token locally.
    ///
    /// Never fails and is safe to call repeatedly.
    pub async fn logout(&self) {
        if self.token().await.is_some() {
            let descriptor = RequestDescriptor::post(endpoints::LOGOUT)
                .authenticated()
                .build();
            let response = self.api.execute(&descriptor).await;
            if !response.is_success() {
                tracing::warn!(
                    status = ?response.status_code(),
                    message = response.message_or(""),
                    "remote logout failed, clearing local session anyway"
                );
            }
        }
        self.clear_session().await;
    }

    /// Drop the persisted token and the in-memory session without calling
    /// the server.
    pub async fn clear_session(&self) {
        if let Err(e) = self.store.remove(AUTH_TOKEN_KEY).await {
            tracing::error!("Failed to clear persisted token: {}", e);
        }
        self.api.session().clear().await;
        tracing::info!("session cleared");
    }

    /// Restore a persisted token into the session. No network traffic.
    pub async fn initialize_auth(&self) -> Option<String> {
        match self.try_initialize_auth().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!("Failed to read persisted token: {}", e);
                None
            }
        }
    }

    /// Like [`initialize_auth`](Self::initialize_auth), surfacing store failures.
    pub async fn try_initialize_auth(&self) -> Result<Option<String>, StoreError> {
        let token = self
            .store
            .get(AUTH_TOKEN_KEY)
            .await?
            .filter(|token| !token.is_empty());
        if let Some(token) = &token {
            self.api.session().set_token(token.clone()).await;
        }
        Ok(token)
    }

    /// Whether a token is persisted.
    pub async fn is_logged_in(&self) -> bool {
        matches!(self.store.get(AUTH_TOKEN_KEY).await, Ok(Some(token)) if !token.is_empty())
    }

    pub async fn token(&self) -> Option<String> {
        self.api.session().token().await
    }

    pub async fn current_user(&self) -> Option<User> {
        self.api.session().user().await
    }

    pub async fn set_user(&self, user: Option<User>) {
        self.api.session().set_user(user).await;
    }

    async fn exchange<B: serde::Serialize>(&self, endpoint: &str, body: &B) -> ApiResponse<Value> {
        let descriptor = match RequestDescriptor::post(endpoint).json_from(body) {
            Ok(builder) => builder.build(),
            Err(e) => return classify(&ApiError::from(e)),
        };
        let response = self.api.execute(&descriptor).await;
        if response.is_success() {
            self.capture_session(response.data()).await;
        }
        response
    }

    /// Adopt the token and user from a credential response.
    ///
    /// A response without a token leaves no session behind, so a token from
    /// an earlier sign-in is never reused.
    async fn capture_session(&self, body: Option<&Value>) {
        let Some(token) = body.and_then(extract_token) else {
            tracing::warn!("credential response did not include a token");
            self.clear_session().await;
            return;
        };
        self.persist_token(&token).await;
        self.api.session().set_token(token).await;
        let user = body.and_then(extract_user);
        self.api.session().set_user(user).await;
        tracing::info!("session established");
    }

    async fn persist_token(&self, token: &str) {
        if let Err(e) = self.store.set(AUTH_TOKEN_KEY, token).await {
            tracing::error!("Failed to persist token: {}", e);
        }
    }
}
