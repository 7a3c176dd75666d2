//! CLI command definitions.

pub mod counter;
pub mod files;
pub mod profile;
pub mod users;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use courier_core::HttpMethod;

/// CLI client for a courier-compatible REST API.
#[derive(Debug, Parser)]
#[command(name = "courier")]
#[command(about = "CLI client for a courier-compatible REST API", long_about = None)]
pub struct Cli {
    /// API base URL. Falls back to the configured default.
    #[arg(long, env = "COURIER_BASE_URL")]
    pub base_url: Option<String>,

    /// File the session token and counter are persisted in.
    #[arg(long, env = "COURIER_STORE", default_value = ".courier/store.json")]
    pub store: PathBuf,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Suppress progress and intermediate states.
    #[arg(long)]
    pub quiet: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, env = "COURIER_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and persist the token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "COURIER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "COURIER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Sign out and forget the token.
    Logout,
    /// Exchange the current token for a new one.
    Refresh,
    /// Restore the persisted session and show who is signed in.
    Whoami,
    /// Profile of the signed-in user.
    Profile(profile::ProfileCommand),
    /// User management.
    Users(users::UsersCommand),
    /// Upload files.
    Upload(files::UploadCommand),
    /// Download a file.
    Download(files::DownloadCommand),
    /// Send an arbitrary request and print the response envelope.
    Request {
        /// HTTP method.
        method: HttpMethod,
        /// Endpoint relative to the base URL, or an absolute URL.
        endpoint: String,
        /// JSON request body.
        #[arg(long)]
        data: Option<String>,
        /// Query parameter as key=value; repeatable.
        #[arg(long = "query", value_parser = parse_key_value)]
        query: Vec<(String, String)>,
        /// Send the bearer token.
        #[arg(long)]
        auth: bool,
    },
    /// Persisted counter demo.
    Counter(counter::CounterCommand),
}

/// Parse a `key=value` pair.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}
