//! Pre-flight upload checks.
//!
//! Validation is a pure function over file metadata gathered by the caller,
//! so rejection never needs a network round trip.

use std::path::Path;

use crate::http::ApiError;

/// What the shell knows about a file before uploading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub exists: bool,
    pub size: u64,
}

impl FileMeta {
    pub fn missing() -> Self {
        Self {
            exists: false,
            size: 0,
        }
    }

    pub fn present(size: u64) -> Self {
        Self { exists: true, size }
    }
}

/// Limits a file must satisfy.
#[derive(Debug, Clone, Copy)]
pub struct UploadRules<'a> {
    pub max_file_size: u64,
    /// Allowed extensions, lower case without the dot. `None` allows anything.
    pub allowed_extensions: Option<&'a [String]>,
}

/// Outcome of a pre-flight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadCheck {
    Ok,
    Rejected(String),
}

impl UploadCheck {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Turn a rejection into the validation error the classifier understands.
    pub fn into_error(self) -> Option<ApiError> {
        match self {
            Self::Ok => None,
            Self::Rejected(reason) => Some(ApiError::Validation(reason)),
        }
    }
}

/// Check one file against the rules.
///
/// Order: existence, size, extension.
///
/// # Examples
///
/// ```
/// use courier_core::upload::{validate_upload, FileMeta, UploadCheck, UploadRules};
///
/// let rules = UploadRules { max_file_size: 10, allowed_extensions: None };
/// assert_eq!(validate_upload("a.txt".as_ref(), &FileMeta::present(5), &rules), UploadCheck::Ok);
/// assert!(!validate_upload("a.txt".as_ref(), &FileMeta::present(11), &rules).is_ok());
/// ```
pub fn validate_upload(path: &Path, meta: &FileMeta, rules: &UploadRules<'_>) -> UploadCheck {
    if !meta.exists {
        return UploadCheck::Rejected(format!("File not found: {}", path.display()));
    }

    if meta.size > rules.max_file_size {
        return UploadCheck::Rejected(format!(
            "File size exceeds {} limit",
            format_size(rules.max_file_size)
        ));
    }

    if let Some(allowed) = rules.allowed_extensions {
        let extension = file_extension(path);
        let permitted = extension
            .as_deref()
            .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);
        if !permitted {
            return UploadCheck::Rejected(format!(
                "File type not allowed. Allowed types: {}",
                allowed.join(", ")
            ));
        }
    }

    UploadCheck::Ok
}

/// Check every file, stopping at the first rejection.
pub fn validate_uploads<'p>(
    files: impl IntoIterator<Item = (&'p Path, FileMeta)>,
    rules: &UploadRules<'_>,
) -> UploadCheck {
    for (path, meta) in files {
        let check = validate_upload(path, &meta, rules);
        if !check.is_ok() {
            return check;
        }
    }
    UploadCheck::Ok
}

/// Lower-case extension of a path, without the dot.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Human readable size in binary units.
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB && bytes % GIB == 0 {
        format!("{} GB", bytes / GIB)
    } else if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}
