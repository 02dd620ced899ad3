//! Upload operations implementation
//!
//! An upload runs two tasks at once. The encoder task turns the source into
//! a multipart body and pushes it into a conduit; the calling task streams
//! the conduit to the shard as the request body. Once the shard has
//! answered, the caller collects the encoder's result, reconciles both, and
//! registers the stored content at its destination path.

use crate::client::CloudClient;
use crate::error::{CloudError, Result};
use crate::metadata::register_file;
use crate::upload::conduit;
use crate::upload::multipart::MultipartEncoder;
use crate::upload::streaming::ProgressReader;
use crate::upload::types::{
    validate_destination, UploadOutcome, UploadProgress, UploadRequest, UploadResult,
    MAX_FILE_SIZE, MULTIPART_OVERHEAD,
};
use bytesize::ByteSize;
use log::{debug, info, warn};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::time::Instant;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;

/// Upload a file from the filesystem
///
/// Opens `request.source`, streams it to the session's upload shard as a
/// single multipart request and registers the stored content at
/// `request.destination`.
///
/// # Arguments
///
/// * `client` - The client session to upload with
/// * `request` - Source path, destination path and optional progress sink
///
/// # Returns
///
/// An `UploadResult` with the content hash and size the storage assigned
///
/// # Errors
///
/// Returns an error if:
/// - The session has no upload shard or no auth token
/// - The source cannot be opened or inspected
/// - The source is larger than [`MAX_FILE_SIZE`]; nothing is sent then
/// - Encoding, the transfer or the registration fails
pub async fn upload_file(client: &CloudClient, request: UploadRequest) -> Result<UploadResult> {
    request.validate()?;
    client.upload_endpoint()?;
    client.auth_token()?;

    let source_error = |source| CloudError::Source {
        path: request.source.clone(),
        source,
    };
    let file = tokio::fs::File::open(&request.source)
        .await
        .map_err(source_error)?;
    let metadata = file.metadata().await.map_err(source_error)?;
    let size = metadata.len();

    check_size(size).inspect_err(|e| warn!("Refusing {}: {}", request.source.display(), e))?;

    debug!(
        "Uploading {} ({}) to {}",
        request.source.display(),
        ByteSize(size),
        request.destination
    );

    upload_reader(client, file, size, &request.destination, request.progress).await
}

/// Upload `size` bytes read from `source`
///
/// The single-request path behind [`upload_file`] for sources that are not
/// files. The reader must produce exactly `size` bytes; a shorter source
/// fails the upload even if the shard accepted the request.
pub async fn upload_reader<R>(
    client: &CloudClient,
    source: R,
    size: u64,
    destination: &str,
    progress: Option<mpsc::Sender<UploadProgress>>,
) -> Result<UploadResult>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    validate_destination(destination)?;
    check_size(size)?;
    let endpoint = client.upload_endpoint()?.upload.clone();
    client.auth_token()?;

    let start_time = Instant::now();

    let encoder = MultipartEncoder::new()?;
    let content_type = encoder.content_type();
    let content_length = size + MULTIPART_OVERHEAD;
    debug_assert_eq!(encoder.overhead(), MULTIPART_OVERHEAD);

    let (writer, reader) = conduit::open(client.config().conduit_capacity);
    let encoder = encoder.spawn(source, size, writer);

    let body = ProgressReader::new(reader, content_length, progress);
    let body = reqwest::Body::wrap_stream(ReaderStream::with_capacity(
        body,
        client.config().read_chunk_size,
    ));

    let transfer = send_part(client, &endpoint, &content_type, content_length, body).await;
    let encoded = encoder.finish().await;
    let outcome = reconcile(transfer, encoded)
        .inspect_err(|e| warn!("Upload to {} failed: {}", destination, e))?;

    if !outcome.is_success() {
        let err = CloudError::rejected("upload", outcome.status, outcome.body);
        warn!("{}", err);
        return Err(err);
    }

    let receipt = outcome
        .receipt()
        .inspect_err(|e| warn!("Upload to {} returned no receipt: {}", destination, e))?;
    if receipt.bytes != size {
        warn!(
            "Shard reports {} bytes for {}, {} were sent",
            receipt.bytes, destination, size
        );
    }

    if let Err(e) = register_file(client, destination, &receipt.hash, &receipt.size).await {
        warn!(
            "Content {} is stored but not registered at {}: {}",
            receipt.hash, destination, e
        );
        return Err(CloudError::Registration {
            destination: destination.to_string(),
            hash: receipt.hash,
            size: receipt.size,
            source: Box::new(e),
        });
    }

    let duration = start_time.elapsed();
    info!(
        "Uploaded {} ({}) as {} in {} ms",
        destination,
        ByteSize(receipt.bytes),
        receipt.hash,
        duration.as_millis()
    );

    Ok(UploadResult::new(destination.to_string(), receipt).duration_ms(duration.as_millis() as u64))
}

fn check_size(size: u64) -> Result<()> {
    if size > MAX_FILE_SIZE {
        return Err(CloudError::FileTooLarge {
            size,
            limit: MAX_FILE_SIZE,
        });
    }
    Ok(())
}

/// POST the multipart body and read the whole response
async fn send_part(
    client: &CloudClient,
    endpoint: &str,
    content_type: &str,
    content_length: u64,
    body: reqwest::Body,
) -> Result<UploadOutcome> {
    let response = client
        .http()
        .post(endpoint)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .body(body)
        .send()
        .await
        .map_err(|e| CloudError::transport("upload", e))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| CloudError::transport("upload", e))?;

    Ok(UploadOutcome { status, body })
}

/// Combine what the transport and the encoder reported.
///
/// An encoder failure explains whatever the transport saw, so it wins. The
/// exception is an encoder that only stopped because the transport dropped
/// the body: a transport error or a shard rejection is then the cause.
/// A closed conduit after a 200 stays fatal, the shard never saw the whole
/// file.
fn reconcile(transfer: Result<UploadOutcome>, encoded: Result<u64>) -> Result<UploadOutcome> {
    match (transfer, encoded) {
        (Ok(outcome), Ok(_)) => Ok(outcome),
        (Err(transport), Err(encode)) if encode.is_conduit_closed() => Err(transport),
        (Ok(outcome), Err(encode)) if encode.is_conduit_closed() && !outcome.is_success() => {
            debug!("Shard answered {} before reading the whole body", outcome.status);
            Ok(outcome)
        }
        (_, Err(encode)) => Err(encode),
        (Err(transport), Ok(_)) => Err(transport),
    }
}
