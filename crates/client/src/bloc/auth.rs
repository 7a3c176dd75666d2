use async_trait::async_trait;
use courier_core::auth::{extract_token, fallback_user, RefreshOutcome, RegisterRequest, User};
use courier_core::http::GENERIC_ERROR_MESSAGE;
use courier_core::state::AuthState;
use serde_json::Value;

use super::{Bloc, BlocHandler, Emitter};
use crate::api::{AuthClient, UserApi};

pub type AuthBloc = Bloc<AuthHandler>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// Restore a persisted session on startup.
    AppStarted,
    LoginRequested {
        email: String,
        password: String,
    },
    RegisterRequested(RegisterRequest),
    RefreshRequested,
    LogoutRequested,
}

pub struct AuthHandler {
    auth: AuthClient,
    users: UserApi,
}

impl AuthHandler {
    pub fn new(auth: AuthClient) -> Self {
        let users = UserApi::new(auth.api().clone());
        Self { auth, users }
    }

    /// Start an [`AuthBloc`] in [`AuthState::Initial`].
    pub fn spawn(auth: AuthClient) -> AuthBloc {
        Bloc::new(Self::new(auth), AuthState::Initial)
    }

    async fn app_started(&self, emit: &Emitter<AuthState>) {
        let token = match self.auth.try_initialize_auth().await {
            Ok(Some(token)) => token,
            Ok(None) => return emit.emit(AuthState::Unauthenticated),
            Err(e) => {
                return emit.emit(AuthState::Error {
                    message: e.to_string(),
                })
            }
        };

        let profile = self.users.get_profile().await;
        match profile.into_data() {
            Some(user) => {
                self.auth.set_user(Some(user.clone())).await;
                emit.emit(AuthState::Authenticated { user, token });
            }
            None => {
                tracing::info!("stored token rejected, signing out");
                self.auth.clear_session().await;
                emit.emit(AuthState::Unauthenticated);
            }
        }
    }

    /// Shared tail of login and registration.
    async fn complete_sign_in(
        &self,
        response_body: Option<&Value>,
        email: &str,
        name: Option<&str>,
        emit: &Emitter<AuthState>,
    ) {
        let Some(token) = response_body.and_then(extract_token) else {
            return emit.emit(AuthState::Error {
                message: "No token in server response".to_string(),
            });
        };

        let user = self.resolve_user(response_body, email, name).await;
        emit.emit(AuthState::Authenticated { user, token });
    }

    /// The server's profile, or the fallback when it cannot be fetched.
    async fn resolve_user(&self, body: Option<&Value>, email: &str, name: Option<&str>) -> User {
        let profile = self.users.get_profile().await;
        let user = if profile.is_success() {
            profile.into_data()
        } else {
            None
        };
        let user = user.unwrap_or_else(|| {
            tracing::warn!("profile fetch failed, using fallback user");
            fallback_user(body, email, name)
        });
        self.auth.set_user(Some(user.clone())).await;
        user
    }
}

#[async_trait]
impl BlocHandler for AuthHandler {
    type Event = AuthEvent;
    type State = AuthState;

    async fn handle(&self, event: AuthEvent, emit: &Emitter<AuthState>) {
        emit.emit(AuthState::Loading);

        match event {
            AuthEvent::AppStarted => self.app_started(emit).await,
            AuthEvent::LoginRequested { email, password } => {
                let response = self.auth.login(&email, &password).await;
                if !response.is_success() {
                    return emit.emit(AuthState::Error {
                        message: response.message_or(GENERIC_ERROR_MESSAGE).to_string(),
                    });
                }
                self.complete_sign_in(response.data(), &email, None, emit)
                    .await;
            }
            AuthEvent::RegisterRequested(request) => {
                let response = self.auth.register(&request).await;
                if !response.is_success() {
                    return emit.emit(AuthState::Error {
                        message: response.message_or(GENERIC_ERROR_MESSAGE).to_string(),
                    });
                }
                self.complete_sign_in(
                    response.data(),
                    &request.email,
                    Some(&request.name),
                    emit,
                )
                .await;
            }
            AuthEvent::RefreshRequested => match self.auth.refresh().await {
                RefreshOutcome::Refreshed { token } => {
                    let user = match self.auth.current_user().await {
                        Some(user) => user,
                        None => self.resolve_user(None, "", None).await,
                    };
                    emit.emit(AuthState::Authenticated { user, token });
                }
                RefreshOutcome::Expired { message } => {
                    emit.emit(AuthState::TokenExpired { message });
                }
            },
            AuthEvent::LogoutRequested => {
                self.auth.logout().await;
                emit.emit(AuthState::Unauthenticated);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use crate::session::SessionContext;
    use crate::store::MemoryStore;
    use crate::transport::MockTransport;
    use courier_core::storage::keys::AUTH_TOKEN_KEY;
    use courier_core::{ApiConfig, ApiError, HttpMethod, KeyValueStore};
    use serde_json::json;
    use std::sync::Arc;
    use tokio_stream::StreamExt;

    struct Harness {
        mock: MockTransport,
        store: MemoryStore,
        bloc: AuthBloc,
    }

    fn harness() -> Harness {
        let mock = MockTransport::new();
        let store = MemoryStore::new();
        let api = ApiClient::with_transport(
            ApiConfig::with_base_url("http://api.test/api"),
            Arc::new(mock.clone()),
            SessionContext::new(),
        );
        let bloc = AuthHandler::spawn(AuthClient::new(api, Arc::new(store.clone())));
        Harness { mock, store, bloc }
    }

    async fn run(bloc: AuthBloc, events: Vec<AuthEvent>) -> Vec<AuthState> {
        let states = bloc.subscribe();
        for event in events {
            bloc.add(event).unwrap();
        }
        bloc.close().await;
        states.collect().await
    }

    fn login(email: &str) -> AuthEvent {
        AuthEvent::LoginRequested {
            email: email.to_string(),
            password: "pw".to_string(),
        }
    }

    #[tokio::test]
    async fn app_started_without_token_is_unauthenticated_with_no_requests() {
        let h = harness();
        let states = run(h.bloc, vec![AuthEvent::AppStarted]).await;
        assert_eq!(states, vec![AuthState::Loading, AuthState::Unauthenticated]);
        assert_eq!(h.mock.request_count(), 0);
    }

    #[tokio::test]
    async fn app_started_with_valid_token_restores_user() {
        let h = harness();
        h.store.set(AUTH_TOKEN_KEY, "T1").await.unwrap();
        h.mock.respond(
            HttpMethod::Get,
            "/api/user/profile",
            200,
            json!({"id": 1, "name": "Ada", "email": "a@b.com"}),
        );

        let states = run(h.bloc, vec![AuthEvent::AppStarted]).await;
        match states.last() {
            Some(AuthState::Authenticated { user, token }) => {
                assert_eq!(token, "T1");
                assert_eq!(user.name, "Ada");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            h.mock.last_request().unwrap().header("Authorization"),
            Some("Bearer T1")
        );
    }

    #[tokio::test]
    async fn app_started_with_rejected_token_clears_it() {
        let h = harness();
        h.store.set(AUTH_TOKEN_KEY, "STALE").await.unwrap();
        h.mock
            .respond(HttpMethod::Get, "/api/user/profile", 401, json!({}));

        let states = run(h.bloc, vec![AuthEvent::AppStarted]).await;
        assert_eq!(states.last(), Some(&AuthState::Unauthenticated));
        assert_eq!(h.store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn login_then_profile_fetch() {
        let h = harness();
        h.mock
            .respond(HttpMethod::Post, "/api/auth/login", 200, json!({"token": "T1"}))
            .respond(
                HttpMethod::Get,
                "/api/user/profile",
                200,
                json!({"data": {"id": 7, "name": "Ada", "email": "ada@b.com"}}),
            );

        let states = run(h.bloc, vec![login("ada@b.com")]).await;
        assert_eq!(states.first(), Some(&AuthState::Loading));
        match states.last() {
            Some(AuthState::Authenticated { user, token }) => {
                assert_eq!(token, "T1");
                assert_eq!(user.id, "7");
            }
            other => panic!("unexpected {other:?}"),
        }

        let profile = h.mock.requests_to("/api/user/profile");
        assert_eq!(profile[0].header("Authorization"), Some("Bearer T1"));
    }

    #[tokio::test]
    async fn login_with_failed_profile_uses_fallback_user() {
        let h = harness();
        h.mock
            .respond(HttpMethod::Post, "/api/auth/login", 200, json!({"token": "T1"}))
            .fail(
                HttpMethod::Get,
                "/api/user/profile",
                ApiError::Connection("down".to_string()),
            );

        let states = run(h.bloc, vec![login("grace@b.com")]).await;
        match states.last() {
            Some(AuthState::Authenticated { user, .. }) => {
                assert_eq!(user.email, "grace@b.com");
                assert_eq!(user.name, "grace");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_with_failed_profile_uses_submitted_name() {
        let h = harness();
        h.mock
            .respond(HttpMethod::Post, "/api/auth/register", 201, json!({"token": "T9"}))
            .respond(HttpMethod::Get, "/api/user/profile", 500, json!({}));

        let request = RegisterRequest {
            name: "Grace Hopper".to_string(),
            email: "grace@b.com".to_string(),
            password: "pw".to_string(),
            phone: Some("555".to_string()),
        };
        let states = run(h.bloc, vec![AuthEvent::RegisterRequested(request)]).await;
        match states.last() {
            Some(AuthState::Authenticated { user, token }) => {
                assert_eq!(token, "T9");
                assert_eq!(user.name, "Grace Hopper");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_failure_reports_classified_message() {
        let h = harness();
        h.mock.respond(HttpMethod::Post, "/api/auth/login", 401, json!({}));

        let states = run(h.bloc, vec![login("a@b.com")]).await;
        assert_eq!(
            states,
            vec![
                AuthState::Loading,
                AuthState::Error {
                    message: "Unauthorized. Please login again.".to_string()
                }
            ]
        );
    }

    #[tokio::test]
    async fn refresh_unauthorized_emits_token_expired() {
        let h = harness();
        h.store.set(AUTH_TOKEN_KEY, "T1").await.unwrap();
        h.mock
            .respond(HttpMethod::Get, "/api/user/profile", 200, json!({"id": 1}))
            .respond(HttpMethod::Post, "/api/auth/refresh", 401, json!({}));

        let states = run(
            h.bloc,
            vec![AuthEvent::AppStarted, AuthEvent::RefreshRequested],
        )
        .await;
        assert!(matches!(states.last(), Some(AuthState::TokenExpired { .. })));
        assert_eq!(h.store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn refresh_success_keeps_known_user() {
        let h = harness();
        h.store.set(AUTH_TOKEN_KEY, "T1").await.unwrap();
        h.mock
            .respond(
                HttpMethod::Get,
                "/api/user/profile",
                200,
                json!({"id": 1, "name": "Ada"}),
            )
            .respond(HttpMethod::Post, "/api/auth/refresh", 200, json!({"token": "T2"}));

        let states = run(
            h.bloc,
            vec![AuthEvent::AppStarted, AuthEvent::RefreshRequested],
        )
        .await;
        match states.last() {
            Some(AuthState::Authenticated { user, token }) => {
                assert_eq!(token, "T2");
                assert_eq!(user.name, "Ada");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(h.mock.requests_to("/api/user/profile").len(), 1);
    }

    #[tokio::test]
    async fn logout_twice_ends_unauthenticated() {
        let h = harness();
        h.store.set(AUTH_TOKEN_KEY, "T1").await.unwrap();
        h.mock.respond(HttpMethod::Post, "/api/auth/logout", 500, json!({}));

        let states = run(
            h.bloc,
            vec![AuthEvent::LogoutRequested, AuthEvent::LogoutRequested],
        )
        .await;
        assert_eq!(
            states,
            vec![
                AuthState::Loading,
                AuthState::Unauthenticated,
                AuthState::Loading,
                AuthState::Unauthenticated
            ]
        );
        assert_eq!(h.store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn login_without_token_does_not_reuse_previous_session() {
        let h = harness();
        h.mock
            .respond_once(HttpMethod::Post, "/api/auth/login", 200, json!({"token": "T_A"}))
            .respond_once(HttpMethod::Post, "/api/auth/login", 200, json!({"ok": true}))
            .respond(
                HttpMethod::Get,
                "/api/user/profile",
                200,
                json!({"id": 1, "name": "Alice", "email": "a@x.com"}),
            );

        let states = run(h.bloc, vec![login("a@x.com"), login("b@x.com")]).await;
        assert_eq!(
            states.last(),
            Some(&AuthState::Error {
                message: "No token in server response".to_string()
            })
        );
        assert_eq!(h.store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
        assert_eq!(h.mock.requests_to("/api/user/profile").len(), 1);
    }
}
