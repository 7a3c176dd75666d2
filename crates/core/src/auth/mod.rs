mod functions;
mod types;

pub use functions::{email_to_name, extract_token, extract_user, fallback_user};
pub use types::{
    ChangePasswordRequest, LoginRequest, RefreshOutcome, RegisterRequest, UpdateProfileRequest,
    User,
};
