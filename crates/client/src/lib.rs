//! courier_client - imperative shell for the courier API client.
//!
//! Wires the pure pieces of `courier_core` to the network (reqwest), the
//! local key-value store and the bloc runtime.

pub mod api;
pub mod bloc;
pub mod cli;
pub mod client;
pub mod error;
pub mod output;
pub mod progress;
pub mod session;
pub mod store;
pub mod transport;

pub use api::{AuthClient, FileUploadApi, GenericApi, UserApi};
pub use client::ApiClient;
pub use error::{ClientError, Result};
pub use session::{SessionContext, SessionState};
