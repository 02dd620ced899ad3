//! Client session for the cloud service
//!
//! `CloudClient` holds everything an upload needs from the surrounding
//! session: the HTTP client, the metadata API root, the auth token and the
//! upload shard. Logging in and discovering shards happen elsewhere; their
//! results are handed to the client.

use crate::client::config::CloudConfig;
use crate::error::{CloudError, Result};
use reqwest::Url;
use std::time::Duration;

/// The upload endpoint assigned to the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardEndpoint {
    /// URL accepting the multipart file upload
    pub upload: String,
}

impl ShardEndpoint {
    pub fn new<S: Into<String>>(upload: S) -> Self {
        Self {
            upload: upload.into(),
        }
    }
}

/// A client bound to one authenticated session
#[derive(Debug, Clone)]
pub struct CloudClient {
    http: reqwest::Client,
    config: CloudConfig,
    api_base: Url,
    auth_token: Option<String>,
    shard: Option<ShardEndpoint>,
}

impl CloudClient {
    /// Create a new client with the provided configuration
    ///
    /// The client has no token and no shard yet; set them with
    /// [`with_auth_token`](Self::with_auth_token) and
    /// [`with_shard`](Self::with_shard) before uploading.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use cloud_upload::{CloudClient, CloudConfig, ShardEndpoint};
    ///
    /// let client = CloudClient::new(CloudConfig::default())?
    ///     .with_auth_token("token")
    ///     .with_shard(ShardEndpoint::new("https://upload.example/"));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(config: CloudConfig) -> Result<Self> {
        config.validate()?;
        let api_base = config.parsed_api_base()?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| CloudError::config_error(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            api_base,
            auth_token: None,
            shard: None,
        })
    }

    /// Attach the session's auth token
    pub fn with_auth_token<S: Into<String>>(mut self, token: S) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Attach the session's upload shard
    pub fn with_shard(mut self, shard: ShardEndpoint) -> Self {
        self.shard = Some(shard);
        self
    }

    /// Replace the upload shard, e.g. after shard discovery ran again
    pub fn set_shard(&mut self, shard: ShardEndpoint) {
        self.shard = Some(shard);
    }

    /// Resolve the endpoint uploads go to
    pub fn upload_endpoint(&self) -> Result<&ShardEndpoint> {
        match &self.shard {
            Some(shard) if !shard.upload.trim().is_empty() => Ok(shard),
            Some(_) => Err(CloudError::shard_unavailable("upload shard URL is empty")),
            None => Err(CloudError::shard_unavailable(
                "no upload shard has been resolved for this session",
            )),
        }
    }

    /// The session's auth token
    pub fn auth_token(&self) -> Result<&str> {
        match self.auth_token.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(CloudError::invalid_parameter(
                "token",
                "Auth token must be set before uploading",
            )),
        }
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolve a metadata API path against the configured root
    pub(crate) fn api_url(&self, path: &str) -> Result<Url> {
        self.api_base.join(path).map_err(|e| {
            CloudError::config_error(format!("failed to build API URL for {}: {}", path, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudClient {
        CloudClient::new(CloudConfig::new().api_base_url("http://127.0.0.1:1/api/v2")).unwrap()
    }

    #[test]
    fn test_missing_shard_is_precondition_failure() {
        let client = client();
        assert!(matches!(
            client.upload_endpoint(),
            Err(CloudError::ShardUnavailable { .. })
        ));

        let client = client.with_shard(ShardEndpoint::new("  "));
        assert!(matches!(
            client.upload_endpoint(),
            Err(CloudError::ShardUnavailable { .. })
        ));
    }

    #[test]
    fn test_shard_resolution() {
        let mut client = client().with_shard(ShardEndpoint::new("http://shard-1/upload/"));
        assert_eq!(
            client.upload_endpoint().unwrap().upload,
            "http://shard-1/upload/"
        );

        client.set_shard(ShardEndpoint::new("http://shard-2/upload/"));
        assert_eq!(
            client.upload_endpoint().unwrap().upload,
            "http://shard-2/upload/"
        );
    }

    #[test]
    fn test_auth_token() {
        let client = client();
        assert!(client.auth_token().is_err());

        let client = client.with_auth_token("");
        assert!(client.auth_token().is_err());

        let client = client.with_auth_token("secret");
        assert_eq!(client.auth_token().unwrap(), "secret");
    }

    #[test]
    fn test_api_url() {
        let client = client();
        assert_eq!(
            client.api_url("file/add").unwrap().as_str(),
            "http://127.0.0.1:1/api/v2/file/add"
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = CloudClient::new(CloudConfig::new().conduit_capacity(0));
        assert!(result.is_err());
    }
}
