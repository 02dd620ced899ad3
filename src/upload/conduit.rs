//! In-memory byte pipe between the multipart encoder and the request body
//!
//! Writes suspend once `capacity` bytes are waiting to be read, so the
//! encoder can never run more than one buffer ahead of the network.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

/// Open a conduit holding at most `capacity` unread bytes
pub fn open(capacity: usize) -> (ConduitWriter, ConduitReader) {
    let (writer, reader) = tokio::io::duplex(capacity);
    (ConduitWriter { inner: writer }, ConduitReader { inner: reader })
}

/// Producer side. Shutting it down or dropping it ends the reader's stream.
#[derive(Debug)]
pub struct ConduitWriter {
    inner: DuplexStream,
}

/// Consumer side. Dropping it makes pending and later writes fail with
/// `BrokenPipe`.
#[derive(Debug)]
pub struct ConduitReader {
    inner: DuplexStream,
}

impl AsyncWrite for ConduitWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl AsyncRead for ConduitReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}
