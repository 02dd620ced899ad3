//! Streaming upload client for shard-based cloud storage
//!
//! Files are sent to the session's upload shard as one multipart request
//! whose body is encoded while it is transmitted, then registered at their
//! destination path through the metadata API.

pub mod client;
pub mod error;
pub mod metadata;
pub mod upload;

pub use client::{CloudClient, CloudConfig, ShardEndpoint};

pub use error::{CloudError, Result};

pub use metadata::register_file;

pub use upload::{
    upload_file, upload_reader, UploadOutcome, UploadProgress, UploadReceipt, UploadRequest,
    UploadResult, MAX_FILE_SIZE, MULTIPART_OVERHEAD,
};
