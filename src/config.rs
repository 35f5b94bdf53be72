//! Configuration types for the X-Road SOAP client.

use crate::constants::{
    DEFAULT_PRODUCER_NS_PREFIX, DEFAULT_PROCESSING_WRAPPERS, DEFAULT_PROTOCOL_VERSION,
};
use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// HTTP transport settings
    pub transport: TransportConfig,

    /// Message serialization settings
    pub messages: MessageConfig,
}

impl ClientConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ClientError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ClientError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Read and parse a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }
}

/// HTTP transport settings.
///
/// Timeouts belong to the transport; the client itself imposes none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// TCP connect timeout in seconds (0 disables)
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds (0 disables)
    pub timeout_secs: u64,

    /// User-Agent header value
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            timeout_secs: 60,
            user_agent: format!("xroad-soap-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Message serialization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// X-Road message protocol version written on requests that keep the stock version
    pub protocol_version: String,

    /// Wrap payloads in `request`/`response` elements
    pub process_wrappers: bool,

    /// Producer namespace prefix when the producer declares none
    pub default_namespace_prefix: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            process_wrappers: DEFAULT_PROCESSING_WRAPPERS,
            default_namespace_prefix: DEFAULT_PRODUCER_NS_PREFIX.to_string(),
        }
    }
}
