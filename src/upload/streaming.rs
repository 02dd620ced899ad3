//! Progress tracking for streamed request bodies
//!
//! [`ProgressReader`] sits between the conduit and the HTTP client. It
//! counts every byte the client pulls and offers the running total to an
//! optional progress sink without ever waiting on it.

use crate::upload::types::UploadProgress;
use log::trace;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// An async reader that reports how much of a known total has been read
pub struct ProgressReader<R> {
    inner: R,
    sink: Option<mpsc::Sender<UploadProgress>>,
    bytes_read: u64,
    total_bytes: u64,
}

impl<R> ProgressReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Create a new progress reader
    ///
    /// # Arguments
    ///
    /// * `reader` - The underlying reader to wrap
    /// * `total_bytes` - Total length the reader is expected to produce
    /// * `sink` - Optional channel receiving cumulative progress
    pub fn new(
        reader: R,
        total_bytes: u64,
        sink: Option<mpsc::Sender<UploadProgress>>,
    ) -> Self {
        Self {
            inner: reader,
            sink,
            bytes_read: 0,
            total_bytes,
        }
    }

    /// Get the current progress
    pub fn progress(&self) -> UploadProgress {
        UploadProgress::new(self.bytes_read, self.total_bytes)
    }

    /// Get the number of bytes read so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    fn notify(&mut self) {
        let Some(sink) = &self.sink else {
            return;
        };
        match sink.try_send(self.progress()) {
            Ok(()) => {}
            Err(TrySendError::Full(progress)) => {
                trace!(
                    "Progress sink is full, skipping update at {} bytes",
                    progress.bytes_uploaded
                );
            }
            Err(TrySendError::Closed(_)) => {
                self.sink = None;
            }
        }
    }
}

impl<R> AsyncRead for ProgressReader<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let initial_len = buf.filled().len();

        match Pin::new(&mut self.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let bytes_read = buf.filled().len() - initial_len;

                if bytes_read > 0 {
                    self.bytes_read += bytes_read as u64;
                    self.notify();
                }

                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    }
}
