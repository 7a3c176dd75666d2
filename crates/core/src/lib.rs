//! courier_core - functional core for the courier API client.
//!
//! Everything in this crate is pure: response envelopes, request descriptors,
//! the error classifier, upload validation, presentation states and the
//! storage contract. The imperative shell lives in `courier_client`.

pub mod auth;
pub mod config;
pub mod counter;
pub mod http;
pub mod serde;
pub mod state;
pub mod storage;
pub mod upload;

pub use config::ApiConfig;
pub use http::{classify, ApiError, ApiResponse, HttpMethod, Progress, RequestDescriptor};
pub use storage::{KeyValueStore, StoreError};
