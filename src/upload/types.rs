//! Upload data types and protocol constants

use crate::error::{CloudError, Result};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Largest file a single multipart request may carry.
///
/// The service caps uploads at 2 GiB; 1024 bytes of that are reserved for
/// the multipart envelope.
pub const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024 - 1024;

/// Bytes the multipart envelope adds around the file content.
///
/// Valid for one file field named [`FORM_FIELD_NAME`] with file name
/// [`FORM_FILE_NAME`] and a 30 character boundary. Changing any of those
/// changes this number.
pub const MULTIPART_OVERHEAD: u64 = 180;

/// Name of the multipart field carrying the file
pub const FORM_FIELD_NAME: &str = "file";

/// File name announced in the multipart field
pub const FORM_FILE_NAME: &str = "filename";

#[derive(Debug, Clone, PartialEq)]
pub struct UploadProgress {
    pub bytes_uploaded: u64,
    pub total_bytes: u64,
    pub percentage: f64,
}

impl UploadProgress {
    pub fn new(bytes_uploaded: u64, total_bytes: u64) -> Self {
        let percentage = if total_bytes > 0 {
            bytes_uploaded as f64 / total_bytes as f64
        } else {
            0.0
        };

        Self {
            bytes_uploaded,
            total_bytes,
            percentage: percentage.min(1.0),
        }
    }
}

/// One call to [`upload_file`](crate::upload_file)
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub source: PathBuf,
    pub destination: String,
    pub progress: Option<mpsc::Sender<UploadProgress>>,
}

impl UploadRequest {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(source: P, destination: S) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            progress: None,
        }
    }

    /// Report progress on `sink`.
    ///
    /// Updates are offered without waiting; a sink that is full or never
    /// read simply misses updates.
    pub fn progress(mut self, sink: mpsc::Sender<UploadProgress>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_destination(&self.destination)
    }
}

pub(crate) fn validate_destination(destination: &str) -> Result<()> {
    if destination.trim().is_empty() {
        return Err(CloudError::invalid_parameter(
            "destination",
            "Destination path cannot be empty",
        ));
    }
    Ok(())
}

/// What the storage endpoint answered to the multipart POST
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub status: u16,
    pub body: String,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Parse the `hash;size` receipt of a successful upload
    pub fn receipt(&self) -> Result<UploadReceipt> {
        UploadReceipt::parse(&self.body)
    }
}

/// Content fingerprint and size the storage endpoint assigned to the upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub hash: String,
    /// Size exactly as the endpoint wrote it, forwarded verbatim on registration
    pub size: String,
    pub bytes: u64,
}

impl UploadReceipt {
    pub fn parse(body: &str) -> Result<Self> {
        let mut fields = body.trim().splitn(2, ';');
        let hash = fields.next().unwrap_or_default();
        let size = fields
            .next()
            .ok_or_else(|| CloudError::malformed_response(body))?;

        if hash.is_empty() {
            return Err(CloudError::malformed_response(body));
        }
        let bytes = size
            .parse::<u64>()
            .map_err(|_| CloudError::malformed_response(body))?;

        Ok(Self {
            hash: hash.to_string(),
            size: size.to_string(),
            bytes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub destination: String,
    pub hash: String,
    pub size: u64,
    pub duration_ms: u64,
}

impl UploadResult {
    pub fn new(destination: String, receipt: UploadReceipt) -> Self {
        Self {
            destination,
            hash: receipt.hash,
            size: receipt.bytes,
            duration_ms: 0,
        }
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}
