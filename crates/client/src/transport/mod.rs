//! The network seam.
//!
//! [`ApiClient`](crate::ApiClient) prepares an [`OutgoingRequest`] and hands
//! it to a [`Transport`]. The transport only moves bytes: every status code
//! comes back as a [`RawResponse`], and only failures to get a response at
//! all are reported as [`ApiError`].

mod mock;
mod reqwest_transport;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use courier_core::{ApiError, HttpMethod};
use serde_json::Value;

use crate::progress::ProgressSink;

pub use mock::{MockOutcome, MockTransport};
pub use reqwest_transport::{map_reqwest_error, ReqwestTransport};

/// A fully resolved request: absolute URL, final headers, encoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
    /// Overrides the configured receive timeout for this request.
    pub timeout: Option<Duration>,
}

impl OutgoingRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    /// Header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(BTreeMap<String, String>),
    Multipart(MultipartBody),
}

/// Text fields plus files read from disk at send time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    pub fields: BTreeMap<String, String>,
    pub files: Vec<FilePart>,
}

impl MultipartBody {
    /// Sum of all file sizes; the total reported in progress ticks.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|file| file.size).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field_name: String,
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

/// Whatever the server answered, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// Lower-cased header names.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and collect the whole response body.
    ///
    /// Upload progress for multipart bodies is reported through `progress`.
    async fn send(
        &self,
        request: OutgoingRequest,
        progress: Option<ProgressSink>,
    ) -> Result<RawResponse, ApiError>;

    /// Send a request and stream a 2xx body into `destination`.
    ///
    /// Non-2xx responses are returned with their body and nothing is
    /// written.
    async fn download(
        &self,
        request: OutgoingRequest,
        destination: &Path,
        progress: Option<ProgressSink>,
    ) -> Result<RawResponse, ApiError>;
}
