//! Transport client for the courier API.

mod transfer;

pub use transfer::{DownloadDescriptor, FileUploadDescriptor, MultiFileUploadDescriptor};

use std::sync::Arc;

use courier_core::http::{build_headers, Headers};
use courier_core::{classify, ApiConfig, ApiError, ApiResponse, HttpMethod, RequestDescriptor};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::progress::ProgressSink;
use crate::session::SessionContext;
use crate::transport::{OutgoingRequest, RawResponse, RequestBody, ReqwestTransport, Transport};

/// HTTP client for the courier API.
///
/// Every operation returns an [`ApiResponse`]; transport failures are
/// classified, never raised. Clones share the transport and the session.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ApiConfig>,
    transport: Arc<dyn Transport>,
    session: SessionContext,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client backed by reqwest with a fresh session.
    pub fn new(config: ApiConfig) -> Result<Self> {
        url::Url::parse(&config.base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(
            config,
            Arc::new(transport),
            SessionContext::new(),
        ))
    }

    /// Create from environment (see [`ApiConfig::from_env`]).
    pub fn from_env() -> Result<Self> {
        Self::new(ApiConfig::from_env())
    }

    /// Create a client over any transport and an existing session.
    pub fn with_transport(
        config: ApiConfig,
        transport: Arc<dyn Transport>,
        session: SessionContext,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            session,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Run a request and return the JSON payload.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> ApiResponse<Value> {
        let mut request = self
            .prepare(
                descriptor.method(),
                descriptor.endpoint(),
                descriptor.headers(),
                descriptor.requires_auth(),
            )
            .await;
        if let Some(query) = descriptor.query() {
            request.query = query.to_vec();
        }
        if let Some(body) = descriptor.body() {
            request.body = RequestBody::Json(body.clone());
        }
        request.timeout = descriptor.timeout();

        self.dispatch(request, None).await
    }

    /// Run a request and turn its payload into `T` with `parser`.
    pub async fn execute_with<T, F>(&self, descriptor: &RequestDescriptor, parser: F) -> ApiResponse<T>
    where
        F: FnOnce(Value) -> std::result::Result<T, ApiError>,
    {
        self.execute(descriptor).await.and_then_parse(parser)
    }

    /// Run a request and deserialize its payload.
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> ApiResponse<T> {
        self.execute(descriptor).await.decode()
    }

    pub async fn get(&self, endpoint: &str, requires_auth: bool) -> ApiResponse<Value> {
        let descriptor = RequestDescriptor::get(endpoint)
            .requires_auth(requires_auth)
            .build();
        self.execute(&descriptor).await
    }

    pub async fn post(&self, endpoint: &str, body: Value, requires_auth: bool) -> ApiResponse<Value> {
        let descriptor = RequestDescriptor::post(endpoint)
            .json(body)
            .requires_auth(requires_auth)
            .build();
        self.execute(&descriptor).await
    }

    pub async fn put(&self, endpoint: &str, body: Value, requires_auth: bool) -> ApiResponse<Value> {
        let descriptor = RequestDescriptor::put(endpoint)
            .json(body)
            .requires_auth(requires_auth)
            .build();
        self.execute(&descriptor).await
    }

    pub async fn patch(&self, endpoint: &str, body: Value, requires_auth: bool) -> ApiResponse<Value> {
        let descriptor = RequestDescriptor::patch(endpoint)
            .json(body)
            .requires_auth(requires_auth)
            .build();
        self.execute(&descriptor).await
    }

    pub async fn delete(&self, endpoint: &str, requires_auth: bool) -> ApiResponse<Value> {
        let descriptor = RequestDescriptor::delete(endpoint)
            .requires_auth(requires_auth)
            .build();
        self.execute(&descriptor).await
    }

    /// Resolve the URL and headers shared by every request kind.
    async fn prepare(
        &self,
        method: HttpMethod,
        endpoint: &str,
        caller_headers: Option<&Headers>,
        requires_auth: bool,
    ) -> OutgoingRequest {
        let token = if requires_auth {
            self.session.token().await
        } else {
            None
        };
        let mut request = OutgoingRequest::new(method, self.config.url(endpoint));
        request.headers = build_headers(caller_headers, token.as_deref(), requires_auth);
        request
    }

    async fn dispatch(
        &self,
        request: OutgoingRequest,
        progress: Option<ProgressSink>,
    ) -> ApiResponse<Value> {
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, %url, "sending request");

        match self.transport.send(request, progress).await {
            Ok(raw) => into_envelope(&method, &url, raw),
            Err(error) => {
                tracing::warn!(%method, %url, error = %error, "request failed");
                classify(&error)
            }
        }
    }
}

/// Interpret a raw response: 2xx is success, anything else is classified.
fn into_envelope(method: &HttpMethod, url: &str, raw: RawResponse) -> ApiResponse<Value> {
    let body = parse_body(&raw.body);
    if raw.is_success() {
        let message = body
            .as_ref()
            .and_then(|value| value.get("message"))
            .and_then(Value::as_str)
            .map(String::from);
        return ApiResponse::success(body, message, Some(raw.status), Some(raw.headers));
    }

    tracing::warn!(%method, %url, status = raw.status, "server returned an error status");
    classify(&ApiError::BadResponse {
        status: raw.status,
        body,
    })
}

/// JSON when it parses, the text as a JSON string otherwise, nothing when
/// empty.
fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}
