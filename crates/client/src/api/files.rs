//! File upload and download operations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use courier_core::config::endpoints;
use courier_core::http::unwrap_data;
use courier_core::serde::{deserialize_id, deserialize_optional_string};
use courier_core::{ApiError, ApiResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ApiClient, DownloadDescriptor, FileUploadDescriptor, MultiFileUploadDescriptor};
use crate::progress::ProgressSink;

/// What the server reports about a stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(
        default,
        alias = "filename",
        alias = "fileName",
        deserialize_with = "deserialize_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct FileUploadApi {
    api: ApiClient,
}

impl FileUploadApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Upload any file to the generic upload endpoint.
    pub async fn upload_file(
        &self,
        path: &Path,
        progress: Option<ProgressSink>,
    ) -> ApiResponse<UploadedFile> {
        let descriptor = with_progress(
            FileUploadDescriptor::new(endpoints::UPLOAD, path).authenticated(),
            progress,
        );
        self.api
            .upload_file(descriptor)
            .await
            .and_then_parse(parse_file)
    }

    /// Upload a profile picture; image extensions only.
    pub async fn upload_avatar(
        &self,
        path: &Path,
        progress: Option<ProgressSink>,
    ) -> ApiResponse<UploadedFile> {
        let descriptor = FileUploadDescriptor::new(endpoints::UPLOAD_AVATAR, path)
            .field_name("avatar")
            .allowed_extensions(self.api.config().allowed_image_extensions.clone())
            .authenticated();
        self.api
            .upload_file(with_progress(descriptor, progress))
            .await
            .and_then_parse(parse_file)
    }

    /// Upload a document; document extensions only.
    pub async fn upload_document(
        &self,
        path: &Path,
        progress: Option<ProgressSink>,
    ) -> ApiResponse<UploadedFile> {
        let descriptor = FileUploadDescriptor::new(endpoints::UPLOAD_DOCUMENT, path)
            .field_name("document")
            .allowed_extensions(self.api.config().allowed_document_extensions.clone())
            .authenticated();
        self.api
            .upload_file(with_progress(descriptor, progress))
            .await
            .and_then_parse(parse_file)
    }

    /// Upload several files in one request.
    pub async fn upload_files(
        &self,
        paths: Vec<PathBuf>,
        progress: Option<ProgressSink>,
    ) -> ApiResponse<Vec<UploadedFile>> {
        let mut descriptor =
            MultiFileUploadDescriptor::new(endpoints::UPLOAD_MULTIPLE, paths).authenticated();
        if let Some(sink) = progress {
            descriptor = descriptor.progress(sink);
        }
        self.api
            .upload_files(descriptor)
            .await
            .and_then_parse(parse_files)
    }

    /// Save a remote file to `destination`; returns the path written.
    pub async fn download_file(
        &self,
        url: &str,
        destination: &Path,
        progress: Option<ProgressSink>,
    ) -> ApiResponse<String> {
        let mut descriptor = DownloadDescriptor::new(url, destination).authenticated();
        if let Some(sink) = progress {
            descriptor = descriptor.progress(sink);
        }
        self.api.download(descriptor).await
    }

    pub async fn delete_file(&self, id: &str) -> ApiResponse<Value> {
        self.api
            .delete(&format!("{}/{}", endpoints::FILES, id), true)
            .await
    }
}

fn with_progress(
    descriptor: FileUploadDescriptor,
    progress: Option<ProgressSink>,
) -> FileUploadDescriptor {
    match progress {
        Some(sink) => descriptor.progress(sink),
        None => descriptor,
    }
}

/// Accepts `file`, `{ "data": file }` or `{ "file": file }`.
fn parse_file(value: Value) -> Result<UploadedFile, ApiError> {
    let value = match unwrap_data(value) {
        Value::Object(mut map) if map.get("file").is_some_and(Value::is_object) => {
            map.remove("file").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(value).map_err(ApiError::from)
}

/// Accepts an array, `{ "data": [..] }` or `{ "files": [..] }`.
fn parse_files(value: Value) -> Result<Vec<UploadedFile>, ApiError> {
    let value = match unwrap_data(value) {
        Value::Object(mut map) if map.get("files").is_some_and(Value::is_array) => {
            map.remove("files").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(value).map_err(ApiError::from)
}
