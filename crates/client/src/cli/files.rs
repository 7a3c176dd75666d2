//! Upload and download CLI commands.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Upload one or more files.
#[derive(Debug, Parser)]
pub struct UploadCommand {
    /// What the file is; decides the endpoint and allowed extensions.
    #[arg(long, value_enum, default_value = "files")]
    pub kind: UploadKind,

    /// Files to send.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UploadKind {
    /// Profile picture (images only, single file).
    Avatar,
    /// Document (office formats and text, single file).
    Document,
    /// Any files, sent in one request.
    Files,
}

/// Download a file to disk.
#[derive(Debug, Parser)]
pub struct DownloadCommand {
    /// Endpoint relative to the base URL, or an absolute URL.
    pub url: String,

    /// Where to write the file.
    #[arg(long, short)]
    pub output: PathBuf,
}
