use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::{ApiConfig, ApiError, HttpMethod};
use futures_util::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::{FilePart, MultipartBody, OutgoingRequest, RawResponse, RequestBody, Transport};
use crate::error::Result;
use crate::progress::ProgressSink;

/// Size of each chunk read from disk while streaming an upload.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with the configured connect and receive timeouts.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.receive_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn builder(&self, request: &OutgoingRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: OutgoingRequest,
        progress: Option<ProgressSink>,
    ) -> std::result::Result<RawResponse, ApiError> {
        let builder = self.builder(&request);
        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart(body) => builder.multipart(multipart_form(body, progress)?),
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        collect(response).await
    }

    async fn download(
        &self,
        request: OutgoingRequest,
        destination: &Path,
        progress: Option<ProgressSink>,
    ) -> std::result::Result<RawResponse, ApiError> {
        let response = self
            .builder(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return collect(response).await;
        }

        let status = response.status().as_u16();
        let headers = header_map(response.headers());
        let total = response.content_length();

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
            }
        }

        // A failed transfer must not leave a truncated file under the real name.
        let partial = partial_path(destination);
        let received = match write_body(response, &partial, total, progress.as_ref()).await {
            Ok(received) => received,
            Err(error) => {
                if let Err(e) = tokio::fs::remove_file(&partial).await {
                    tracing::debug!(path = %partial.display(), "partial download not removed: {}", e);
                }
                return Err(error);
            }
        };
        tokio::fs::rename(&partial, destination)
            .await
            .map_err(io_error)?;

        tracing::debug!(path = %destination.display(), bytes = received, "download written");

        Ok(RawResponse {
            status,
            headers,
            body: Vec::new(),
        })
    }
}

/// Sort a reqwest failure into the classifier taxonomy.
pub fn map_reqwest_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout
    } else if error.is_connect() {
        ApiError::Connection(error.to_string())
    } else {
        ApiError::Transport(error.to_string())
    }
}

/// `<destination>.part`, next to the destination.
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

async fn write_body(
    response: reqwest::Response,
    path: &Path,
    total: Option<u64>,
    progress: Option<&ProgressSink>,
) -> std::result::Result<u64, ApiError> {
    let mut file = tokio::fs::File::create(path).await.map_err(io_error)?;
    let mut received = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        file.write_all(&chunk).await.map_err(io_error)?;
        received += chunk.len() as u64;
        if let Some(sink) = progress {
            sink.report(received, total);
        }
    }
    file.flush().await.map_err(io_error)?;
    Ok(received)
}

fn io_error(error: std::io::Error) -> ApiError {
    ApiError::Unexpected(error.to_string())
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn header_map(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

async fn collect(response: reqwest::Response) -> std::result::Result<RawResponse, ApiError> {
    let status = response.status().as_u16();
    let headers = header_map(response.headers());
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    Ok(RawResponse {
        status,
        headers,
        body: body.to_vec(),
    })
}

fn multipart_form(
    body: MultipartBody,
    progress: Option<ProgressSink>,
) -> std::result::Result<Form, ApiError> {
    let total = body.total_size();
    let sent = Arc::new(AtomicU64::new(0));

    let mut form = Form::new();
    for (name, value) in body.fields {
        form = form.text(name, value);
    }
    for file in body.files {
        let field_name = file.field_name.clone();
        let part = file_part(file, progress.clone(), sent.clone(), total)?;
        form = form.part(field_name, part);
    }
    Ok(form)
}

fn file_part(
    file: FilePart,
    progress: Option<ProgressSink>,
    sent: Arc<AtomicU64>,
    total: u64,
) -> std::result::Result<Part, ApiError> {
    let stream = read_chunks(file.path.clone(), progress, sent, total);
    Part::stream_with_length(reqwest::Body::wrap_stream(stream), file.size)
        .file_name(file.file_name)
        .mime_str(&file.content_type)
        .map_err(map_reqwest_error)
}

/// Stream a file from disk, reporting the running total across all parts.
fn read_chunks(
    path: std::path::PathBuf,
    progress: Option<ProgressSink>,
    sent: Arc<AtomicU64>,
    total: u64,
) -> impl Stream<Item = std::io::Result<Vec<u8>>> + Send + 'static {
    async_stream::try_stream! {
        let mut file = tokio::fs::File::open(&path).await?;
        let mut buffer = vec![0u8; UPLOAD_CHUNK_SIZE];
        loop {
            let read = file.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            let so_far = sent.fetch_add(read as u64, Ordering::Relaxed) + read as u64;
            if let Some(sink) = &progress {
                sink.report(so_far, Some(total));
            }
            yield buffer[..read].to_vec();
        }
    }
}
