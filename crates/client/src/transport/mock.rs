use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use courier_core::{ApiError, HttpMethod};
use serde_json::Value;

use super::{OutgoingRequest, RawResponse, RequestBody, Transport};
use crate::progress::ProgressSink;

/// What a scripted route answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOutcome {
    Respond(RawResponse),
    Fail(ApiError),
}

#[derive(Debug)]
struct Route {
    method: HttpMethod,
    path: String,
    outcome: MockOutcome,
    /// `None` answers forever; `Some(n)` answers `n` more times.
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct MockState {
    routes: Vec<Route>,
    requests: Vec<OutgoingRequest>,
}

/// Scripted in-memory transport.
///
/// Routes match on method and URL path. One-shot routes take precedence
/// over persistent ones, so a test can script "first 401, then 200".
/// Unmatched requests get a 404. Every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `method path` with a JSON body.
    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: Value) -> &Self {
        self.push(method, path, MockOutcome::Respond(json_response(status, body)), None)
    }

    /// Answer `method path` with a JSON body once.
    pub fn respond_once(
        &self,
        method: HttpMethod,
        path: &str,
        status: u16,
        body: Value,
    ) -> &Self {
        self.push(
            method,
            path,
            MockOutcome::Respond(json_response(status, body)),
            Some(1),
        )
    }

    /// Always answer `method path` with a prepared raw response.
    pub fn respond_raw(&self, method: HttpMethod, path: &str, response: RawResponse) -> &Self {
        self.push(method, path, MockOutcome::Respond(response), None)
    }

    /// Always fail `method path` before any response arrives.
    pub fn fail(&self, method: HttpMethod, path: &str, error: ApiError) -> &Self {
        self.push(method, path, MockOutcome::Fail(error), None)
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn last_request(&self) -> Option<OutgoingRequest> {
        self.lock().requests.last().cloned()
    }

    /// Requests whose URL path is `path`.
    pub fn requests_to(&self, path: &str) -> Vec<OutgoingRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|request| url_path(&request.url) == path)
            .cloned()
            .collect()
    }

    fn push(
        &self,
        method: HttpMethod,
        path: &str,
        outcome: MockOutcome,
        remaining: Option<usize>,
    ) -> &Self {
        self.lock().routes.push(Route {
            method,
            path: path.to_string(),
            outcome,
            remaining,
        });
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn answer(&self, request: &OutgoingRequest) -> MockOutcome {
        let mut state = self.lock();
        state.requests.push(request.clone());

        let path = url_path(&request.url);
        let matches = |route: &Route| route.method == request.method && route.path == path;

        let once = state
            .routes
            .iter_mut()
            .find(|route| matches(route) && route.remaining.is_some_and(|n| n > 0));
        if let Some(route) = once {
            route.remaining = route.remaining.map(|n| n - 1);
            return route.outcome.clone();
        }

        state
            .routes
            .iter()
            .find(|route| matches(route) && route.remaining.is_none())
            .map(|route| route.outcome.clone())
            .unwrap_or_else(|| {
                MockOutcome::Respond(json_response(
                    404,
                    serde_json::json!({ "message": format!("no mock route for {path}") }),
                ))
            })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        request: OutgoingRequest,
        progress: Option<ProgressSink>,
    ) -> Result<RawResponse, ApiError> {
        let outcome = self.answer(&request);

        if let (RequestBody::Multipart(body), Some(sink)) = (&request.body, &progress) {
            let total = body.total_size();
            let mut sent = 0;
            for file in &body.files {
                sent += file.size;
                sink.report(sent, Some(total));
            }
        }

        match outcome {
            MockOutcome::Respond(response) => Ok(response),
            MockOutcome::Fail(error) => Err(error),
        }
    }

    async fn download(
        &self,
        request: OutgoingRequest,
        destination: &Path,
        progress: Option<ProgressSink>,
    ) -> Result<RawResponse, ApiError> {
        let response = match self.answer(&request) {
            MockOutcome::Respond(response) => response,
            MockOutcome::Fail(error) => return Err(error),
        };
        if !response.is_success() {
            return Ok(response);
        }

        tokio::fs::write(destination, &response.body)
            .await
            .map_err(|e| ApiError::Unexpected(e.to_string()))?;
        if let Some(sink) = &progress {
            let total = response.body.len() as u64;
            sink.report(total / 2, Some(total));
            sink.report(total, Some(total));
        }

        Ok(RawResponse {
            body: Vec::new(),
            ..response
        })
    }
}

fn json_response(status: u16, body: Value) -> RawResponse {
    let body = if body.is_null() {
        Vec::new()
    } else {
        body.to_string().into_bytes()
    };
    RawResponse {
        status,
        headers: [("content-type".to_string(), "application/json".to_string())]
            .into_iter()
            .collect(),
        body,
    }
}

fn url_path(url: &str) -> String {
    url::Url::parse(url)
        .map(|parsed| parsed.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}
