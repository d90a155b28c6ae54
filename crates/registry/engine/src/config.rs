//! Registry admission configuration.
//!
//! Loaded from TOML. Every field has a default, so a partial file (or no
//! file at all) yields a working configuration.

use std::path::Path;

use code_registry_types::AccountAddress;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading a [`RegistryConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for [`PackagePublisher`](crate::PackagePublisher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Accept packages declaring the arbitrary upgrade policy.
    pub allow_arbitrary_policy: bool,

    /// Validate declared dependencies and hand the allowed set to the loader.
    pub dependency_checks: bool,

    /// Accounts whose packages may be depended on without policy checks.
    pub policy_exempt_addresses: Vec<AccountAddress>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            allow_arbitrary_policy: true,
            dependency_checks: true,
            policy_exempt_addresses: (0x1..=0xa).map(AccountAddress::from_u64).collect(),
        }
    }
}

impl RegistryConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn is_policy_exempt(&self, account: &AccountAddress) -> bool {
        self.policy_exempt_addresses.contains(account)
    }
}
