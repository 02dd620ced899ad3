//! Registration of uploaded content at a destination path

use crate::client::CloudClient;
use crate::error::{CloudError, Result};
use crate::upload::types::validate_destination;
use log::{debug, warn};

/// Metadata API path that attaches stored content to a path
pub const FILE_ADD_PATH: &str = "file/add";

/// Conflict policy sent with every registration: fail if the destination
/// already exists, never overwrite or rename.
pub const CONFLICT_POLICY: &str = "strict";

/// Register stored content at `destination`
///
/// # Arguments
///
/// * `client` - The client session; its auth token is sent with the form
/// * `destination` - Full destination path in the cloud
/// * `hash` - Content fingerprint returned by the upload shard
/// * `size` - Content size exactly as the upload shard reported it
///
/// # Returns
///
/// Ok(()) on HTTP 200, otherwise an error carrying the status and the raw
/// response body
pub async fn register_file(
    client: &CloudClient,
    destination: &str,
    hash: &str,
    size: &str,
) -> Result<()> {
    validate_destination(destination)?;
    if hash.is_empty() {
        return Err(CloudError::invalid_parameter(
            "hash",
            "Content hash cannot be empty",
        ));
    }

    let token = client.auth_token()?;
    let url = client.api_url(FILE_ADD_PATH)?;

    debug!("Registering {} ({} bytes) at {}", hash, size, destination);

    let form = [
        ("token", token),
        ("home", destination),
        ("conflict", CONFLICT_POLICY),
        ("hash", hash),
        ("size", size),
    ];
    let response = client
        .http()
        .post(url)
        .form(&form)
        .send()
        .await
        .map_err(|e| CloudError::transport(FILE_ADD_PATH, e))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| CloudError::transport(FILE_ADD_PATH, e))?;

    if status != 200 {
        let err = CloudError::rejected(FILE_ADD_PATH, status, body);
        warn!("{}", err);
        return Err(err);
    }

    Ok(())
}
