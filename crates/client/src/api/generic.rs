//! Typed CRUD over an arbitrary REST resource.

use std::collections::BTreeMap;

use courier_core::http::{FormDescriptor, FormEncoding};
use courier_core::{classify, ApiError, ApiResponse, RequestDescriptor};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;

/// CRUD client for one resource path, e.g. `/posts`.
///
/// Payloads may be bare or wrapped as `{ "data": ... }`.
#[derive(Debug, Clone)]
pub struct GenericApi {
    api: ApiClient,
    resource: String,
    requires_auth: bool,
}

impl GenericApi {
    /// Authenticated by default.
    pub fn new(api: ApiClient, resource: impl Into<String>) -> Self {
        Self {
            api,
            resource: resource.into(),
            requires_auth: true,
        }
    }

    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub async fn list<T: DeserializeOwned>(&self, query: &[(&str, &str)]) -> ApiResponse<Vec<T>> {
        let mut builder = RequestDescriptor::get(self.resource.as_str());
        for (key, value) in query {
            builder = builder.query(*key, value);
        }
        let descriptor = builder.requires_auth(self.requires_auth).build();
        self.api.execute(&descriptor).await.decode_unwrapped()
    }

    pub async fn fetch<T: DeserializeOwned>(&self, id: &str) -> ApiResponse<T> {
        let descriptor = RequestDescriptor::get(self.item_path(id))
            .requires_auth(self.requires_auth)
            .build();
        self.api.execute(&descriptor).await.decode_unwrapped()
    }

    pub async fn create<T, B>(&self, body: &B) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        match RequestDescriptor::post(self.resource.as_str()).json_from(body) {
            Ok(builder) => {
                let descriptor = builder.requires_auth(self.requires_auth).build();
                self.api.execute(&descriptor).await.decode_unwrapped()
            }
            Err(e) => classify(&ApiError::from(e)),
        }
    }

    /// Full replacement with PUT.
    pub async fn update<T, B>(&self, id: &str, body: &B) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        match RequestDescriptor::put(self.item_path(id)).json_from(body) {
            Ok(builder) => {
                let descriptor = builder.requires_auth(self.requires_auth).build();
                self.api.execute(&descriptor).await.decode_unwrapped()
            }
            Err(e) => classify(&ApiError::from(e)),
        }
    }

    pub async fn remove(&self, id: &str) -> ApiResponse<Value> {
        self.api
            .delete(&self.item_path(id), self.requires_auth)
            .await
    }

    /// POST a flat form to the resource path.
    pub async fn submit_form(
        &self,
        fields: BTreeMap<String, String>,
        encoding: FormEncoding,
    ) -> ApiResponse<Value> {
        let mut form = FormDescriptor::new(self.resource.as_str(), encoding);
        form.fields = fields;
        form.requires_auth = self.requires_auth;
        self.api.submit_form(&form).await
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.resource.trim_end_matches('/'), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionContext;
    use crate::transport::{MockTransport, RequestBody};
    use courier_core::{ApiConfig, HttpMethod};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Post {
        id: u32,
        title: String,
    }

    fn posts(mock: &MockTransport) -> GenericApi {
        let api = ApiClient::with_transport(
            ApiConfig::with_base_url("http://api.test/api"),
            Arc::new(mock.clone()),
            SessionContext::new(),
        );
        GenericApi::new(api, "/posts")
    }

    #[tokio::test]
    async fn list_and_fetch_decode_wrapped_payloads() {
        let mock = MockTransport::new();
        mock.respond(
            HttpMethod::Get,
            "/api/posts",
            200,
            json!({"data": [{"id": 1, "title": "Hello"}]}),
        )
        .respond(
            HttpMethod::Get,
            "/api/posts/1",
            200,
            json!({"id": 1, "title": "Hello"}),
        );
        let api = posts(&mock);

        let listed: ApiResponse<Vec<Post>> = api.list(&[("q", "hel")]).await;
        assert_eq!(listed.data().map(Vec::len), Some(1));
        assert_eq!(
            mock.last_request().unwrap().query,
            vec![("q".to_string(), "hel".to_string())]
        );

        let fetched: ApiResponse<Post> = api.fetch("1").await;
        assert_eq!(
            fetched.into_data(),
            Some(Post {
                id: 1,
                title: "Hello".to_string()
            })
        );
    }

    #[tokio::test]
    async fn create_update_remove() {
        let mock = MockTransport::new();
        mock.respond(
            HttpMethod::Post,
            "/api/posts",
            201,
            json!({"data": {"id": 2, "title": "New"}}),
        )
        .respond(
            HttpMethod::Put,
            "/api/posts/2",
            200,
            json!({"id": 2, "title": "Edited"}),
        )
        .respond(HttpMethod::Delete, "/api/posts/2", 204, Value::Null);
        let api = posts(&mock);

        let created: ApiResponse<Post> = api.create(&json!({"title": "New"})).await;
        assert_eq!(created.status_code(), Some(201));
        assert_eq!(created.data().map(|p| p.id), Some(2));

        let updated: ApiResponse<Post> = api.update("2", &json!({"title": "Edited"})).await;
        assert_eq!(updated.data().map(|p| p.title.as_str()), Some("Edited"));

        assert!(api.remove("2").await.is_success());
    }

    #[tokio::test]
    async fn public_resource_sends_no_bearer() {
        let mock = MockTransport::new();
        mock.respond(HttpMethod::Post, "/api/posts", 200, json!({}));
        let api = posts(&mock).public();
        api.api.session().set_token("T1").await;

        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "Hi".to_string());
        api.submit_form(fields, FormEncoding::UrlEncoded).await;

        let request = mock.last_request().unwrap();
        assert_eq!(request.header("Authorization"), None);
        assert!(matches!(request.body, RequestBody::Form(_)));
    }
}
