//! Upload operations
//!
//! This module streams local files to the cloud as single multipart
//! requests, with progress tracking and size validation.

pub mod conduit;
pub mod multipart;
pub mod operations;
pub mod streaming;
pub mod types;

pub use multipart::{random_boundary, EncoderHandle, MultipartEncoder};
pub use operations::{upload_file, upload_reader};
pub use streaming::ProgressReader;
pub use types::{
    UploadOutcome, UploadProgress, UploadReceipt, UploadRequest, UploadResult, FORM_FIELD_NAME,
    FORM_FILE_NAME, MAX_FILE_SIZE, MULTIPART_OVERHEAD,
};
