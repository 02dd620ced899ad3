//! Streaming multipart/form-data encoder
//!
//! The encoder writes a single file field: the part header, the source bytes
//! untouched, and the closing boundary. It runs as its own task and writes
//! into a [`ConduitWriter`](crate::upload::conduit::ConduitWriter), so the
//! body is produced while the HTTP client sends it and is never held in
//! memory as a whole.

use crate::error::{CloudError, Result};
use crate::upload::conduit::ConduitWriter;
use crate::upload::types::{FORM_FIELD_NAME, FORM_FILE_NAME};
use log::debug;
use rand::rngs::OsRng;
use rand::RngCore;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;

/// Random bytes behind a boundary token
const BOUNDARY_ENTROPY_BYTES: usize = 15;

/// Generate a boundary token: 15 random bytes as 30 hex characters.
///
/// The usual 60 character boundaries are rejected by the storage service.
pub fn random_boundary() -> Result<String> {
    let mut buf = [0u8; BOUNDARY_ENTROPY_BYTES];
    OsRng.try_fill_bytes(&mut buf).map_err(|e| CloudError::Encode {
        source: io::Error::new(io::ErrorKind::Other, e),
    })?;
    Ok(hex::encode(buf))
}

/// Encoder for one multipart body carrying one file
#[derive(Debug, Clone)]
pub struct MultipartEncoder {
    boundary: String,
}

impl MultipartEncoder {
    /// Create an encoder with a fresh random boundary
    pub fn new() -> Result<Self> {
        Ok(Self::with_boundary(random_boundary()?))
    }

    pub fn with_boundary<S: Into<String>>(boundary: S) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value of the request's `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Everything written before the file content
    pub fn head(&self) -> String {
        format!(
            "--{}\r\n\
             Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            self.boundary, FORM_FIELD_NAME, FORM_FILE_NAME
        )
    }

    /// Everything written after the file content
    pub fn tail(&self) -> String {
        format!("\r\n--{}--\r\n", self.boundary)
    }

    /// Bytes the envelope adds to the content
    pub fn overhead(&self) -> u64 {
        (self.head().len() + self.tail().len()) as u64
    }

    /// Write the full multipart body for `expected_len` bytes of `source`.
    ///
    /// Exactly `expected_len` bytes are copied. A source that ends earlier
    /// fails with `UnexpectedEof` before the closing boundary is written, so
    /// the receiver never sees a well-formed but short body. On success the
    /// sink is shut down and the number of content bytes is returned.
    pub async fn encode<R, W>(&self, source: R, expected_len: u64, sink: &mut W) -> io::Result<u64>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        sink.write_all(self.head().as_bytes()).await?;

        let mut content = source.take(expected_len);
        let copied = tokio::io::copy(&mut content, sink).await?;
        if copied != expected_len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "source ended after {} of {} bytes",
                    copied, expected_len
                ),
            ));
        }

        sink.write_all(self.tail().as_bytes()).await?;
        sink.shutdown().await?;
        Ok(copied)
    }

    /// Run [`encode`](Self::encode) on its own task, writing into `sink`.
    ///
    /// The source and the sink belong to the task and are released when it
    /// ends, whatever the outcome. The outcome is handed over through the
    /// returned [`EncoderHandle`].
    pub fn spawn<R>(self, source: R, expected_len: u64, mut sink: ConduitWriter) -> EncoderHandle
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = self.encode(source, expected_len, &mut sink).await;
            drop(sink);
            match &result {
                Ok(copied) => debug!("Encoder finished after {} content bytes", copied),
                Err(e) => debug!("Encoder stopped: {}", e),
            }
            // The receiver is gone only if the upload call itself was dropped.
            let _ = tx.send(result);
        });
        EncoderHandle { rx }
    }
}

/// Completion of a spawned encoder
#[derive(Debug)]
pub struct EncoderHandle {
    rx: oneshot::Receiver<io::Result<u64>>,
}

impl EncoderHandle {
    /// Wait for the encoder and return how many content bytes it wrote
    pub async fn finish(self) -> Result<u64> {
        match self.rx.await {
            Ok(Ok(copied)) => Ok(copied),
            Ok(Err(source)) => Err(CloudError::Encode { source }),
            Err(_) => Err(CloudError::Encode {
                source: io::Error::new(
                    io::ErrorKind::Other,
                    "encoder task ended without reporting a result",
                ),
            }),
        }
    }
}
