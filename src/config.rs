//! Client configuration.
//!
//! [`Settings`] is the loose, serializable surface (what a config file or a
//! caller provides). [`ClientConfig`] is the validated, immutable result that
//! a [`Client`](crate::Client) is built from.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};

/// API version used when none is configured.
pub const DEFAULT_VERSION: &str = "v1";

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// User-facing client settings.
///
/// Deserializes from the YAML written by the PQL command line tools:
///
/// ```yaml
/// url: http://localhost:8080
/// namespace: test_1
/// version: v1
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Server address; must include a port. Also accepted as `url`.
    #[serde(alias = "url")]
    pub server_address: String,

    /// Namespace to query.
    pub namespace: String,

    /// API version (defaults to `v1`).
    #[serde(default = "default_version")]
    pub version: String,

    /// Replace ISO-8601 strings in results with temporal values.
    #[serde(default)]
    pub coerce_dates: bool,
}

impl Settings {
    /// Settings for `namespace` on `server_address`, API `v1`, no date coercion.
    pub fn new(server_address: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            server_address: server_address.into(),
            namespace: namespace.into(),
            version: default_version(),
            coerce_dates: false,
        }
    }

    /// Use a different API version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Enable or disable date coercion.
    pub fn with_coerce_dates(mut self, coerce_dates: bool) -> Self {
        self.coerce_dates = coerce_dates;
        self
    }

    /// Parse settings from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load settings from a YAML file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Validate the settings into an immutable [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the server address has no usable port.
    pub fn build(&self) -> Result<ClientConfig> {
        let endpoint = Endpoint::build(&self.server_address, &self.namespace, &self.version)?;
        Ok(ClientConfig::new(endpoint, self.coerce_dates))
    }
}

/// Validated configuration of a [`Client`](crate::Client).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    endpoint: Endpoint,
    coerce_dates: bool,
}

impl ClientConfig {
    /// Create a config from an already-built endpoint.
    pub fn new(endpoint: Endpoint, coerce_dates: bool) -> Self {
        Self {
            endpoint,
            coerce_dates,
        }
    }

    /// Target endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Whether records pass through date coercion.
    pub fn coerce_dates(&self) -> bool {
        self.coerce_dates
    }

    pub(crate) fn with_endpoint(&self, endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            coerce_dates: self.coerce_dates,
        }
    }
}
