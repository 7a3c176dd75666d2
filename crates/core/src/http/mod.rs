mod classify;
mod envelope;
mod error;
mod headers;
mod progress;
mod request;

pub use classify::{
    classify, status_message, CANCELLED_MESSAGE, CANCELLED_STATUS, GENERIC_ERROR_MESSAGE,
    NETWORK_ERROR_MESSAGE, NO_RESPONSE_STATUS, TIMEOUT_MESSAGE, TIMEOUT_STATUS, VALIDATION_STATUS,
};
pub use envelope::{unwrap_data, ApiResponse, Headers};
pub use error::ApiError;
pub use headers::{
    bearer, build_headers, remove_header, set_header, ACCEPT, APPLICATION_JSON, AUTHORIZATION,
    CONTENT_TYPE, FORM_URLENCODED,
};
pub use progress::Progress;
pub use request::{
    FormDescriptor, FormEncoding, HttpMethod, RequestDescriptor, RequestDescriptorBuilder,
};
