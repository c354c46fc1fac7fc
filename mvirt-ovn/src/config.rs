//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for [`crate::OvnClient`].
///
/// Unset fields fall back to [`ClientConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Value of the `vendor` external id stamped on rows this client creates.
    pub vendor: String,
    /// Name of the cluster-wide logical router.
    pub cluster_router: String,
    /// CIDR(s) of the node switch, comma separated for dual stack.
    pub node_switch_cidr: String,
    /// Upper bound for a single transaction round trip.
    pub transact_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            vendor: "mvirt".to_string(),
            cluster_router: "ovn-cluster".to_string(),
            node_switch_cidr: "100.64.0.0/16".to_string(),
            transact_timeout_secs: 60,
        }
    }
}

impl ClientConfig {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.vendor.is_empty() {
            return Err(ConfigError::Invalid("vendor must not be empty".into()));
        }
        if self.transact_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "transact_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn transact_timeout(&self) -> Duration {
        Duration::from_secs(self.transact_timeout_secs)
    }
}
