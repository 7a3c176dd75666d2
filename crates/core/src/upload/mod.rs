mod mime;
mod validation;

pub use mime::content_type_for;
pub use validation::{
    file_extension, format_size, validate_upload, validate_uploads, FileMeta, UploadCheck,
    UploadRules,
};
