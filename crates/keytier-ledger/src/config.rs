//! # Engine Configuration
//!
//! Operational limits for the ledger engine, loadable from YAML for
//! deployments that tune them. Defaults match the ledger's documented
//! constants.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Operational limits for a [`LedgerEngine`](crate::LedgerEngine).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Largest `count` accepted by key creation.
    pub max_keys_per_create: u32,
    /// Page size used by the transaction log query when the caller does
    /// not supply one.
    pub default_page_size: usize,
    /// Largest page size honored; larger requests are clamped.
    pub max_page_size: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_keys_per_create: 100,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl LedgerConfig {
    /// Load a configuration from YAML.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_yaml(s: &str) -> Result<Self, LedgerError> {
        serde_yaml::from_str(s).map_err(|e| LedgerError::InvalidArgument(format!("config: {e}")))
    }

    /// Resolve a requested page size against the defaults and cap.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = LedgerConfig::default();
        assert_eq!(cfg.max_keys_per_create, 100);
        assert_eq!(cfg.default_page_size, 10);
        assert_eq!(cfg.max_page_size, 100);
    }

    #[test]
    fn test_from_yaml_partial() {
        let cfg = LedgerConfig::from_yaml("default_page_size: 25\n").unwrap();
        assert_eq!(cfg.default_page_size, 25);
        assert_eq!(cfg.max_keys_per_create, 100);
    }

    #[test]
    fn test_from_yaml_malformed() {
        assert!(LedgerConfig::from_yaml("default_page_size: [nope").is_err());
    }

    #[test]
    fn test_page_size_resolution() {
        let cfg = LedgerConfig::default();
        assert_eq!(cfg.page_size(None), 10);
        assert_eq!(cfg.page_size(Some(25)), 25);
        assert_eq!(cfg.page_size(Some(0)), 1);
        assert_eq!(cfg.page_size(Some(10_000)), 100);
    }
}
