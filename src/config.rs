//! Policy configuration.
//!
//! Loaded from JSON. Every field has a default, so `{}` is a valid
//! configuration: accept every capability, default affinity tuning.
//!
//! ```json
//! {
//!   "capabilities": {
//!     "auth_providers": ["radius", "eap-tls"],
//!     "networks": null
//!   },
//!   "affinity": { "switch_margin": 2.0 },
//!   "decay_interval_secs": 10
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::affinity::AffinityConfig;
use crate::canonical::canonical_hash_hex;
use crate::resolver::{AcceptAll, CapabilityFilter, ConfiguredFilter};

/// Default period between affinity decay steps.
pub const DEFAULT_DECAY_INTERVAL_SECS: u64 = 10;

/// Error loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Content is not a valid configuration.
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Capabilities this node can satisfy.
///
/// `None` accepts every capability of that kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Supported auth providers.
    pub auth_providers: Option<Vec<String>>,
    /// Joinable target networks.
    pub networks: Option<Vec<String>>,
}

/// Top-level policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Capability allow lists feeding the resolver's filter.
    pub capabilities: CapabilityConfig,
    /// Affinity tuning.
    pub affinity: AffinityConfig,
    /// Seconds between affinity decay steps.
    pub decay_interval_secs: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            capabilities: CapabilityConfig::default(),
            affinity: AffinityConfig::default(),
            decay_interval_secs: DEFAULT_DECAY_INTERVAL_SECS,
        }
    }
}

impl PolicyConfig {
    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Period between affinity decay steps.
    pub fn decay_interval(&self) -> Duration {
        Duration::from_secs(self.decay_interval_secs)
    }

    /// Build the capability filter for the resolver.
    pub fn capability_filter(&self) -> Arc<dyn CapabilityFilter> {
        let filter = ConfiguredFilter::from_config(&self.capabilities);
        if filter.is_accept_all() {
            Arc::new(AcceptAll)
        } else {
            Arc::new(filter)
        }
    }

    /// Stable hash of the configuration, for correlating logged decisions
    /// with the configuration in force.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CapabilityNode;

    #[test]
    fn test_empty_json_is_default() {
        let config = PolicyConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PolicyConfig::default());
        assert_eq!(config.decay_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = PolicyConfig::from_json_str(
            r#"{ "affinity": { "switch_margin": 2.5 }, "capabilities": { "networks": ["campus"] } }"#,
        )
        .unwrap();

        assert_eq!(config.affinity.switch_margin, 2.5);
        assert_eq!(config.affinity.increment, 1.0);
        assert_eq!(config.capabilities.auth_providers, None);
        assert_eq!(config.capabilities.networks, Some(vec!["campus".to_string()]));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            PolicyConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = PolicyConfig::from_path("/nonexistent/netjoin.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_capability_filter_from_config() {
        let config = PolicyConfig::from_json_str(
            r#"{ "capabilities": { "auth_providers": ["radius"] } }"#,
        )
        .unwrap();
        let filter = config.capability_filter();

        assert!(filter.admits(&CapabilityNode::auth_provider("radius")));
        assert!(!filter.admits(&CapabilityNode::auth_provider("portal")));
        assert!(filter.admits(&CapabilityNode::network("anything")));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = PolicyConfig::default();
        let mut b = PolicyConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());

        b.decay_interval_secs = 30;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
