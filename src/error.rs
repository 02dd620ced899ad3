//! Error handling for the cloud upload client
//!
//! This module defines the error type used throughout the library. Every
//! variant keeps enough context for a caller to tell which stage of an
//! upload failed and what the remote service said about it.

use bytesize::ByteSize;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CloudError>;

fn human(bytes: &u64) -> ByteSize {
    ByteSize(*bytes)
}

/// Error types that can occur while uploading to the cloud
#[derive(Error, Debug)]
pub enum CloudError {
    /// The session has no usable upload shard
    #[error("Upload shard unavailable: {message}")]
    ShardUnavailable { message: String },

    /// Invalid parameter
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// The source file could not be opened or inspected
    #[error("Cannot read source {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source is larger than a single request can carry
    #[error(
        "File upload with size {} ({size} bytes) is not supported, the limit is {limit} bytes",
        human(.size)
    )]
    FileTooLarge { size: u64, limit: u64 },

    /// The multipart encoder failed while producing the request body
    #[error("Multipart encoding failed: {source}")]
    Encode {
        #[source]
        source: std::io::Error,
    },

    /// The request could not be built or the network exchange failed
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote service answered with a non-200 status
    #[error("{operation} failed. Status: {status}, Msg: {body}")]
    Rejected {
        operation: String,
        status: u16,
        body: String,
    },

    /// The storage endpoint accepted the upload but its receipt is unreadable
    #[error("Malformed upload response: {body:?}")]
    MalformedResponse { body: String },

    /// The content reached storage but was not attached to its destination
    #[error("Uploaded content {hash} ({size} bytes) was not registered at {destination}: {source}")]
    Registration {
        destination: String,
        hash: String,
        size: String,
        #[source]
        source: Box<CloudError>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Create a new shard unavailable error
    pub fn shard_unavailable(message: impl Into<String>) -> Self {
        CloudError::ShardUnavailable {
            message: message.into(),
        }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        CloudError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        CloudError::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new transport error for the named operation
    pub fn transport(operation: impl Into<String>, source: reqwest::Error) -> Self {
        CloudError::Transport {
            operation: operation.into(),
            source,
        }
    }

    /// Create a new remote rejection error
    pub fn rejected(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        CloudError::Rejected {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a new malformed response error
    pub fn malformed_response(body: impl Into<String>) -> Self {
        CloudError::MalformedResponse { body: body.into() }
    }

    /// Whether the encoder stopped only because the transport stopped reading.
    ///
    /// Such an error is a symptom of a transport failure, not its cause.
    pub fn is_conduit_closed(&self) -> bool {
        matches!(
            self,
            CloudError::Encode { source } if source.kind() == std::io::ErrorKind::BrokenPipe
        )
    }

    /// Whether the bytes may already be stored remotely without a path
    /// pointing at them.
    pub fn is_orphaned_upload(&self) -> bool {
        matches!(self, CloudError::Registration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let err = CloudError::shard_unavailable("no shard");
        assert!(matches!(err, CloudError::ShardUnavailable { .. }));

        let err = CloudError::invalid_parameter("token", "missing");
        assert!(matches!(err, CloudError::InvalidParameter { .. }));

        let err = CloudError::rejected("upload", 500, "boom");
        assert!(matches!(err, CloudError::Rejected { status: 500, .. }));
    }

    #[test]
    fn test_error_display() {
        let err = CloudError::rejected("file/add", 400, "already exists");
        assert_eq!(
            err.to_string(),
            "file/add failed. Status: 400, Msg: already exists"
        );

        let err = CloudError::invalid_parameter("token", "missing");
        assert_eq!(err.to_string(), "Invalid parameter: token - missing");

        let err = CloudError::FileTooLarge {
            size: 3 * 1024 * 1024 * 1024,
            limit: 1024,
        };
        let message = err.to_string();
        assert!(message.contains("3221225472 bytes"));
        assert!(message.contains("limit is 1024 bytes"));
    }

    #[test]
    fn test_conduit_closed_detection() {
        let closed = CloudError::Encode {
            source: io::Error::from(io::ErrorKind::BrokenPipe),
        };
        assert!(closed.is_conduit_closed());

        let truncated = CloudError::Encode {
            source: io::Error::from(io::ErrorKind::UnexpectedEof),
        };
        assert!(!truncated.is_conduit_closed());
        assert!(!CloudError::config_error("x").is_conduit_closed());
    }

    #[test]
    fn test_registration_error_keeps_receipt() {
        let err = CloudError::Registration {
            destination: "/a/b.bin".to_string(),
            hash: "ABCDEF".to_string(),
            size: "42".to_string(),
            source: Box::new(CloudError::rejected("file/add", 403, "denied")),
        };
        assert!(err.is_orphaned_upload());
        let message = err.to_string();
        assert!(message.contains("ABCDEF"));
        assert!(message.contains("/a/b.bin"));
        assert!(message.contains("denied"));
    }
}
