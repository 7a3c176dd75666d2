//! Uploads, downloads and form submissions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use courier_core::http::{
    remove_header, set_header, FormDescriptor, FormEncoding, CONTENT_TYPE, FORM_URLENCODED,
};
use courier_core::upload::{content_type_for, validate_uploads, FileMeta, UploadRules};
use courier_core::{classify, ApiError, ApiResponse, HttpMethod};
use serde_json::Value;

use super::{into_envelope, ApiClient};
use crate::progress::ProgressSink;
use crate::transport::{FilePart, MultipartBody, RequestBody};

/// One file sent as multipart form data.
#[derive(Debug, Clone)]
pub struct FileUploadDescriptor {
    endpoint: String,
    file: PathBuf,
    field_name: String,
    additional_fields: BTreeMap<String, String>,
    requires_auth: bool,
    allowed_extensions: Option<Vec<String>>,
    progress: Option<ProgressSink>,
}

impl FileUploadDescriptor {
    pub fn new(endpoint: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            file: file.into(),
            field_name: "file".to_string(),
            additional_fields: BTreeMap::new(),
            requires_auth: false,
            allowed_extensions: None,
            progress: None,
        }
    }

    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Extra text field sent alongside the file.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_fields.insert(name.into(), value.into());
        self
    }

    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Reject files whose extension is not listed.
    pub fn allowed_extensions(mut self, extensions: Vec<String>) -> Self {
        self.allowed_extensions = Some(extensions);
        self
    }

    pub fn progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Several files under one field name.
#[derive(Debug, Clone)]
pub struct MultiFileUploadDescriptor {
    endpoint: String,
    files: Vec<PathBuf>,
    field_name: String,
    additional_fields: BTreeMap<String, String>,
    requires_auth: bool,
    allowed_extensions: Option<Vec<String>>,
    progress: Option<ProgressSink>,
}

impl MultiFileUploadDescriptor {
    pub fn new(endpoint: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            files,
            field_name: "files".to_string(),
            additional_fields: BTreeMap::new(),
            requires_auth: false,
            allowed_extensions: None,
            progress: None,
        }
    }

    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_fields.insert(name.into(), value.into());
        self
    }

    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn allowed_extensions(mut self, extensions: Vec<String>) -> Self {
        self.allowed_extensions = Some(extensions);
        self
    }

    pub fn progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// A body streamed to disk.
#[derive(Debug, Clone)]
pub struct DownloadDescriptor {
    /// Endpoint relative to the base URL, or an absolute URL.
    url: String,
    destination: PathBuf,
    requires_auth: bool,
    progress: Option<ProgressSink>,
}

impl DownloadDescriptor {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            requires_auth: false,
            progress: None,
        }
    }

    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

impl ApiClient {
    /// Validate and upload one file.
    ///
    /// A file that fails validation produces a failure envelope with status
    /// 500 and nothing is sent.
    pub async fn upload_file(&self, descriptor: FileUploadDescriptor) -> ApiResponse<Value> {
        let FileUploadDescriptor {
            endpoint,
            file,
            field_name,
            additional_fields,
            requires_auth,
            allowed_extensions,
            progress,
        } = descriptor;

        self.upload(UploadJob {
            endpoint,
            files: vec![file],
            field_name,
            additional_fields,
            requires_auth,
            allowed_extensions,
            progress,
        })
        .await
    }

    /// Validate every file, then upload them in one multipart request.
    pub async fn upload_files(&self, descriptor: MultiFileUploadDescriptor) -> ApiResponse<Value> {
        let MultiFileUploadDescriptor {
            endpoint,
            files,
            field_name,
            additional_fields,
            requires_auth,
            allowed_extensions,
            progress,
        } = descriptor;

        if files.is_empty() {
            return classify(&ApiError::Validation("No files selected".to_string()));
        }

        self.upload(UploadJob {
            endpoint,
            files,
            field_name,
            additional_fields,
            requires_auth,
            allowed_extensions,
            progress,
        })
        .await
    }

    /// Stream a response body to disk. On success the payload is the
    /// destination path.
    pub async fn download(&self, descriptor: DownloadDescriptor) -> ApiResponse<String> {
        let request = self
            .prepare(
                HttpMethod::Get,
                &descriptor.url,
                None,
                descriptor.requires_auth,
            )
            .await;
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%url, destination = %descriptor.destination.display(), "starting download");

        let raw = match self
            .transport
            .download(request, &descriptor.destination, descriptor.progress)
            .await
        {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(%url, error = %error, "download failed");
                return classify(&error);
            }
        };

        if !raw.is_success() {
            return into_envelope(&method, &url, raw).map(|_| String::new());
        }

        ApiResponse::success(
            Some(descriptor.destination.display().to_string()),
            None,
            Some(raw.status),
            Some(raw.headers),
        )
    }

    /// Submit a flat form, url-encoded or multipart.
    pub async fn submit_form(&self, descriptor: &FormDescriptor) -> ApiResponse<Value> {
        let mut request = self
            .prepare(
                HttpMethod::Post,
                &descriptor.endpoint,
                None,
                descriptor.requires_auth,
            )
            .await;

        match descriptor.encoding {
            FormEncoding::UrlEncoded => {
                set_header(&mut request.headers, CONTENT_TYPE, FORM_URLENCODED);
                request.body = RequestBody::Form(descriptor.fields.clone());
            }
            FormEncoding::Multipart => {
                remove_header(&mut request.headers, CONTENT_TYPE);
                request.body = RequestBody::Multipart(MultipartBody {
                    fields: descriptor.fields.clone(),
                    files: Vec::new(),
                });
            }
        }

        self.dispatch(request, None).await
    }

    async fn upload(&self, job: UploadJob) -> ApiResponse<Value> {
        let mut metas = Vec::with_capacity(job.files.len());
        for path in &job.files {
            metas.push(file_meta(path).await);
        }

        let rules = UploadRules {
            max_file_size: self.config.max_file_size,
            allowed_extensions: job.allowed_extensions.as_deref(),
        };
        let check = validate_uploads(
            job.files.iter().map(PathBuf::as_path).zip(metas.iter().copied()),
            &rules,
        );
        if let Some(error) = check.into_error() {
            tracing::warn!(endpoint = %job.endpoint, error = %error, "upload rejected");
            return classify(&error);
        }

        let files = job
            .files
            .iter()
            .zip(&metas)
            .map(|(path, meta)| FilePart {
                field_name: job.field_name.clone(),
                path: path.clone(),
                file_name: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "upload".to_string()),
                content_type: content_type_for(path).to_string(),
                size: meta.size,
            })
            .collect();

        let mut request = self
            .prepare(HttpMethod::Post, &job.endpoint, None, job.requires_auth)
            .await;
        remove_header(&mut request.headers, CONTENT_TYPE);
        request.body = RequestBody::Multipart(MultipartBody {
            fields: job.additional_fields,
            files,
        });

        self.dispatch(request, job.progress).await
    }
}

/// Upload parameters shared by the single and multi-file paths.
struct UploadJob {
    endpoint: String,
    files: Vec<PathBuf>,
    field_name: String,
    additional_fields: BTreeMap<String, String>,
    requires_auth: bool,
    allowed_extensions: Option<Vec<String>>,
    progress: Option<ProgressSink>,
}

async fn file_meta(path: &Path) -> FileMeta {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => FileMeta::present(meta.len()),
        _ => FileMeta::missing(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::progress_channel;
    use crate::session::SessionContext;
    use crate::transport::MockTransport;
    use courier_core::http::VALIDATION_STATUS;
    use courier_core::ApiConfig;
    use serde_json::json;
    use std::sync::Arc;

    fn client(mock: &MockTransport) -> ApiClient {
        ApiClient::with_transport(
            ApiConfig::with_base_url("http://api.test/api"),
            Arc::new(mock.clone()),
            SessionContext::new(),
        )
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, size: usize) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, vec![b'x'; size]).unwrap();
        path
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_without_sending() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "big.png", 15 * 1024 * 1024);
        let mock = MockTransport::new();

        let response = client(&mock)
            .upload_file(FileUploadDescriptor::new("/upload", path))
            .await;

        assert!(!response.is_success());
        assert_eq!(response.status_code(), Some(VALIDATION_STATUS));
        assert_eq!(response.message(), Some("File size exceeds 10 MB limit"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let mock = MockTransport::new();
        let response = client(&mock)
            .upload_file(FileUploadDescriptor::new("/upload", "/no/such/file.png"))
            .await;

        assert_eq!(response.message(), Some("File not found: /no/such/file.png"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn extension_allow_list_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "script.exe", 10);
        let mock = MockTransport::new();

        let response = client(&mock)
            .upload_file(
                FileUploadDescriptor::new("/upload", path)
                    .allowed_extensions(vec!["png".to_string(), "jpg".to_string()]),
            )
            .await;

        assert_eq!(
            response.message(),
            Some("File type not allowed. Allowed types: png, jpg")
        );
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn upload_builds_multipart_request_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "avatar.png", 2048);
        let mock = MockTransport::new();
        mock.respond(HttpMethod::Post, "/api/upload", 201, json!({"url": "/f/1"}));
        let api = client(&mock);
        api.session().set_token("T1").await;

        let (sink, mut ticks) = progress_channel();
        let response = api
            .upload_file(
                FileUploadDescriptor::new("/upload", &path)
                    .field_name("avatar")
                    .field("folder", "profile")
                    .authenticated()
                    .progress(sink),
            )
            .await;
        assert!(response.is_success());

        let request = mock.last_request().unwrap();
        assert_eq!(request.header("Authorization"), Some("Bearer T1"));
        assert_eq!(request.header("Content-Type"), None);
        let RequestBody::Multipart(body) = request.body else {
            panic!("expected multipart body");
        };
        assert_eq!(body.fields.get("folder"), Some(&"profile".to_string()));
        assert_eq!(body.files.len(), 1);
        assert_eq!(body.files[0].field_name, "avatar");
        assert_eq!(body.files[0].file_name, "avatar.png");
        assert_eq!(body.files[0].content_type, "image/png");
        assert_eq!(body.files[0].size, 2048);

        let tick = ticks.try_recv().unwrap();
        assert_eq!(tick.transferred, 2048);
        assert_eq!(tick.total, Some(2048));
    }

    #[tokio::test]
    async fn multi_upload_stops_at_first_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(&dir, "a.txt", 10);
        let mock = MockTransport::new();

        let response = client(&mock)
            .upload_files(MultiFileUploadDescriptor::new(
                "/upload/multiple",
                vec![good, dir.path().join("missing.txt")],
            ))
            .await;

        assert!(!response.is_success());
        assert!(response.message().unwrap().starts_with("File not found"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn multi_upload_requires_files() {
        let mock = MockTransport::new();
        let response = client(&mock)
            .upload_files(MultiFileUploadDescriptor::new("/upload/multiple", Vec::new()))
            .await;
        assert_eq!(response.message(), Some("No files selected"));
    }

    #[tokio::test]
    async fn download_writes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("report.json");
        let mock = MockTransport::new();
        mock.respond(HttpMethod::Get, "/api/files/1", 200, json!({"rows": 3}));

        let (sink, mut ticks) = progress_channel();
        let response = client(&mock)
            .download(DownloadDescriptor::new("/files/1", &destination).progress(sink))
            .await;

        assert!(response.is_success());
        assert_eq!(
            response.data().map(String::as_str),
            Some(destination.display().to_string().as_str())
        );
        let written = std::fs::read_to_string(&destination).unwrap();
        assert_eq!(written, r#"{"rows":3}"#);

        let mut last = None;
        while let Some(tick) = ticks.try_recv() {
            last = Some(tick);
        }
        assert!(last.unwrap().is_complete());
    }

    #[tokio::test]
    async fn failed_download_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("missing.bin");
        let mock = MockTransport::new();
        mock.respond(HttpMethod::Get, "/api/files/9", 403, json!({}));

        let response = client(&mock)
            .download(DownloadDescriptor::new("/files/9", &destination))
            .await;

        assert_eq!(response.message(), Some("Forbidden"));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn url_encoded_form_sets_content_type() {
        let mock = MockTransport::new();
        mock.respond(HttpMethod::Post, "/api/contact", 200, json!({}));

        let form = FormDescriptor::new("/contact", FormEncoding::UrlEncoded).field("name", "Ada");
        client(&mock).submit_form(&form).await;

        let request = mock.last_request().unwrap();
        assert_eq!(request.header("content-type"), Some(FORM_URLENCODED));
        let expected: BTreeMap<String, String> =
            [("name".to_string(), "Ada".to_string())].into_iter().collect();
        assert_eq!(request.body, RequestBody::Form(expected));
    }

    #[tokio::test]
    async fn multipart_form_has_no_files() {
        let mock = MockTransport::new();
        mock.respond(HttpMethod::Post, "/api/contact", 200, json!({}));

        let form = FormDescriptor::new("/contact", FormEncoding::Multipart)
            .field("name", "Ada")
            .authenticated();
        client(&mock).submit_form(&form).await;

        let request = mock.last_request().unwrap();
        assert_eq!(request.header("content-type"), None);
        match request.body {
            RequestBody::Multipart(body) => {
                assert!(body.files.is_empty());
                assert_eq!(body.fields.len(), 1);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }
}
