use async_trait::async_trait;
use courier_core::auth::{UpdateProfileRequest, User};
use courier_core::http::GENERIC_ERROR_MESSAGE;
use courier_core::state::ViewState;

use super::{Bloc, BlocHandler, Emitter};
use crate::api::UserApi;
use crate::session::SessionContext;

pub type ProfileBloc = Bloc<ProfileHandler>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEvent {
    Load,
    Update(UpdateProfileRequest),
}

pub struct ProfileHandler {
    users: UserApi,
    session: SessionContext,
}

impl ProfileHandler {
    pub fn new(users: UserApi, session: SessionContext) -> Self {
        Self { users, session }
    }

    pub fn spawn(users: UserApi, session: SessionContext) -> ProfileBloc {
        Bloc::new(Self::new(users, session), ViewState::Initial)
    }
}

#[async_trait]
impl BlocHandler for ProfileHandler {
    type Event = ProfileEvent;
    type State = ViewState<User>;

    async fn handle(&self, event: ProfileEvent, emit: &Emitter<ViewState<User>>) {
        let (response, message) = match event {
            ProfileEvent::Load => {
                emit.emit(ViewState::Loading);
                (self.users.get_profile().await, None)
            }
            ProfileEvent::Update(request) => {
                if request.is_empty() {
                    return emit.emit(ViewState::error("Nothing to update"));
                }
                emit.emit(ViewState::Loading);
                (
                    self.users.update_profile(&request).await,
                    Some("Profile updated".to_string()),
                )
            }
        };

        if !response.is_success() {
            return emit.emit(ViewState::error(
                response.message_or(GENERIC_ERROR_MESSAGE),
            ));
        }
        match response.into_data() {
            Some(user) => {
                self.session.set_user(Some(user.clone())).await;
                emit.emit(ViewState::Success {
                    data: user,
                    message,
                });
            }
            None => emit.emit(ViewState::error("Profile response was empty")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use crate::transport::MockTransport;
    use courier_core::{ApiConfig, HttpMethod};
    use serde_json::json;
    use std::sync::Arc;
    use tokio_stream::StreamExt;

    fn spawn(mock: &MockTransport) -> (ProfileBloc, SessionContext) {
        let session = SessionContext::new();
        let api = ApiClient::with_transport(
            ApiConfig::with_base_url("http://api.test/api"),
            Arc::new(mock.clone()),
            session.clone(),
        );
        (
            ProfileHandler::spawn(UserApi::new(api), session.clone()),
            session,
        )
    }

    #[tokio::test]
    async fn load_emits_loading_then_success_and_caches_user() {
        let mock = MockTransport::new();
        mock.respond(
            HttpMethod::Get,
            "/api/user/profile",
            200,
            json!({"id": 1, "name": "Ada"}),
        );
        let (bloc, session) = spawn(&mock);
        let states = bloc.subscribe();

        bloc.add(ProfileEvent::Load).unwrap();
        bloc.close().await;

        let states: Vec<_> = states.collect().await;
        assert_eq!(states[0], ViewState::Loading);
        assert_eq!(states[1].data().map(|u| u.name.as_str()), Some("Ada"));
        assert_eq!(session.user().await.map(|u| u.id), Some("1".to_string()));
    }

    #[tokio::test]
    async fn empty_update_is_rejected_locally() {
        let mock = MockTransport::new();
        let (bloc, _) = spawn(&mock);
        let states = bloc.subscribe();

        bloc.add(ProfileEvent::Update(UpdateProfileRequest::default()))
            .unwrap();
        bloc.close().await;

        let states: Vec<_> = states.collect().await;
        assert_eq!(states, vec![ViewState::error("Nothing to update")]);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn update_failure_surfaces_message() {
        let mock = MockTransport::new();
        mock.respond(HttpMethod::Put, "/api/user/profile", 403, json!({}));
        let (bloc, _) = spawn(&mock);

        let request = UpdateProfileRequest {
            name: Some("New".to_string()),
            ..Default::default()
        };
        let last = bloc
            .dispatch(ProfileEvent::Update(request), |s| s.is_terminal(), |_| {})
            .await;
        assert_eq!(last, Some(ViewState::error("Forbidden")));
    }
}
