//! Domain API clients built on [`ApiClient`](crate::ApiClient).

mod auth;
mod files;
mod generic;
mod users;

pub use auth::{AuthClient, SESSION_EXPIRED_MESSAGE};
pub use files::{FileUploadApi, UploadedFile};
pub use generic::GenericApi;
pub use users::UserApi;
