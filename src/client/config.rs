//! Client configuration structures

use crate::error::{CloudError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default API root of the metadata service
pub const DEFAULT_API_BASE_URL: &str = "https://cloud.mail.ru/api/v2/";

/// Configuration for a cloud client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Root of the metadata API; registration calls are resolved against it
    #[serde(rename = "api-base-url")]
    pub api_base_url: String,

    /// Deadline in seconds for each whole request, body transfer included (default: none)
    #[serde(rename = "timeout-secs", skip_serializing_if = "Option::is_none", default)]
    pub timeout_secs: Option<u64>,

    /// Bytes the encoder may run ahead of the network (default: 64 KiB)
    #[serde(rename = "conduit-capacity", default = "default_conduit_capacity")]
    pub conduit_capacity: usize,

    /// Largest chunk handed to the HTTP client per read (default: 16 KiB)
    #[serde(rename = "read-chunk-size", default = "default_read_chunk_size")]
    pub read_chunk_size: usize,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

fn default_conduit_capacity() -> usize {
    64 * 1024
}

fn default_read_chunk_size() -> usize {
    16 * 1024
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: None,
            conduit_capacity: default_conduit_capacity(),
            read_chunk_size: default_read_chunk_size(),
            user_agent: default_user_agent(),
        }
    }
}

impl CloudConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the metadata API root
    pub fn api_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the per-request deadline in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set how many bytes may sit between the encoder and the network
    pub fn conduit_capacity(mut self, capacity: usize) -> Self {
        self.conduit_capacity = capacity;
        self
    }

    /// Set the body chunk size handed to the HTTP client
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Set the user agent
    pub fn user_agent<S: Into<String>>(mut self, agent: S) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Parse the API root, making sure relative joins append to it
    pub fn parsed_api_base(&self) -> Result<Url> {
        let mut base = self.api_base_url.trim().to_string();
        if base.is_empty() {
            return Err(CloudError::config_error("api-base-url must not be empty"));
        }
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base).map_err(|e| {
            CloudError::config_error(format!("invalid api-base-url {:?}: {}", self.api_base_url, e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.parsed_api_base()?;

        if self.conduit_capacity == 0 {
            return Err(CloudError::invalid_parameter(
                "conduit_capacity",
                "Conduit capacity must be greater than 0",
            ));
        }

        if self.read_chunk_size == 0 {
            return Err(CloudError::invalid_parameter(
                "read_chunk_size",
                "Read chunk size must be greater than 0",
            ));
        }

        if let Some(timeout) = self.timeout_secs {
            if timeout == 0 {
                return Err(CloudError::invalid_parameter(
                    "timeout",
                    "Timeout must be greater than 0",
                ));
            }
        }

        Ok(())
    }

    /// Convert the configuration to a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(CloudError::from)
    }

    /// Create a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(CloudError::from)
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CloudError::config_error(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }
}
