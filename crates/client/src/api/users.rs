//! User API operations.

use courier_core::auth::{ChangePasswordRequest, UpdateProfileRequest, User};
use courier_core::config::endpoints;
use courier_core::http::unwrap_data;
use courier_core::{classify, ApiError, ApiResponse, RequestDescriptor};
use serde_json::Value;

use crate::client::ApiClient;

#[derive(Debug, Clone)]
pub struct UserApi {
    api: ApiClient,
}

impl UserApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Profile of the signed-in user.
    pub async fn get_profile(&self) -> ApiResponse<User> {
        let descriptor = RequestDescriptor::get(endpoints::PROFILE)
            .authenticated()
            .build();
        self.api.execute_with(&descriptor, parse_user).await
    }

    /// Update the signed-in user's profile. Only set fields are sent.
    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> ApiResponse<User> {
        let descriptor = match RequestDescriptor::put(endpoints::PROFILE).json_from(request) {
            Ok(builder) => builder.authenticated().build(),
            Err(e) => return classify(&ApiError::from(e)),
        };
        self.api.execute_with(&descriptor, parse_user).await
    }

    pub async fn change_password(&self, current: &str, new: &str) -> ApiResponse<Value> {
        let request = ChangePasswordRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };
        let descriptor = match RequestDescriptor::post(endpoints::CHANGE_PASSWORD).json_from(&request)
        {
            Ok(builder) => builder.authenticated().build(),
            Err(e) => return classify(&ApiError::from(e)),
        };
        self.api.execute(&descriptor).await
    }

    /// One page of users.
    pub async fn list_users(&self, page: u32, limit: u32) -> ApiResponse<Vec<User>> {
        let descriptor = RequestDescriptor::get(endpoints::USERS)
            .query("page", page)
            .query("limit", limit)
            .authenticated()
            .build();
        self.api.execute(&descriptor).await.decode_unwrapped()
    }

    pub async fn get_user(&self, id: &str) -> ApiResponse<User> {
        let descriptor = RequestDescriptor::get(user_path(id))
            .authenticated()
            .build();
        self.api.execute_with(&descriptor, parse_user).await
    }

    pub async fn delete_user(&self, id: &str) -> ApiResponse<Value> {
        self.api.delete(&user_path(id), true).await
    }
}

fn user_path(id: &str) -> String {
    format!("{}/{}", endpoints::USERS, id)
}

/// Accepts a bare user, `{ "data": user }` or `{ "user": user }`, in either
/// wrapping order.
fn parse_user(value: Value) -> Result<User, ApiError> {
    let value = unwrap_data(value);
    let value = match value {
        Value::Object(mut map) if map.get("user").is_some_and(Value::is_object) => {
            map.remove("user").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(unwrap_data(value)).map_err(ApiError::from)
}
