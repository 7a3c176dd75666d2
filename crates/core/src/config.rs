use std::{env, time::Duration};

/// Default maximum upload size: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Fixed endpoint paths.
pub mod endpoints {
    pub const LOGIN: &str = "/auth/login";
    pub const REGISTER: &str = "/auth/register";
    pub const REFRESH: &str = "/auth/refresh";
    pub const LOGOUT: &str = "/auth/logout";
    pub const PROFILE: &str = "/user/profile";
    pub const CHANGE_PASSWORD: &str = "/user/change-password";
    pub const USERS: &str = "/users";
    pub const UPLOAD: &str = "/upload";
    pub const UPLOAD_MULTIPLE: &str = "/upload/multiple";
    pub const UPLOAD_AVATAR: &str = "/upload/avatar";
    pub const UPLOAD_DOCUMENT: &str = "/upload/document";
    pub const FILES: &str = "/files";
}

/// Static client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Base URL every endpoint is resolved against.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub receive_timeout: Duration,
    /// Largest file accepted for upload, in bytes.
    pub max_file_size: u64,
    pub allowed_image_extensions: Vec<String>,
    pub allowed_document_extensions: Vec<String>,
    pub allowed_video_extensions: Vec<String>,
}

impl ApiConfig {
    /// Defaults with a different base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `COURIER_BASE_URL` - API base URL (default: "http://localhost:3000/api")
    /// - `COURIER_CONNECT_TIMEOUT_SECS` - connect timeout (default: 30)
    /// - `COURIER_RECEIVE_TIMEOUT_SECS` - receive timeout (default: 30)
    /// - `COURIER_MAX_FILE_SIZE` - upload limit in bytes (default: 10 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("COURIER_BASE_URL").unwrap_or(defaults.base_url),
            connect_timeout: env::var("COURIER_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            receive_timeout: env::var("COURIER_RECEIVE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.receive_timeout),
            max_file_size: env::var("COURIER_MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_file_size),
            ..defaults
        }
    }

    /// Resolve an endpoint against the base URL. Absolute URLs pass through.
    ///
    /// # Examples
    ///
    /// ```
    /// use courier_core::ApiConfig;
    ///
    /// let config = ApiConfig::with_base_url("https://api.example.com/v1/");
    /// assert_eq!(config.url("/users"), "https://api.example.com/v1/users");
    /// assert_eq!(config.url("https://cdn.example.com/a.png"), "https://cdn.example.com/a.png");
    /// ```
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            )
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            connect_timeout: Duration::from_secs(30),
            receive_timeout: Duration::from_secs(30),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_image_extensions: to_strings(&["jpg", "jpeg", "png", "gif", "webp"]),
            allowed_document_extensions: to_strings(&["pdf", "doc", "docx", "txt", "xls", "xlsx"]),
            allowed_video_extensions: to_strings(&["mp4", "mov", "avi", "mkv"]),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
