//! Per-account package registry.

use serde::{Deserialize, Serialize};

use crate::package::PackageMetadata;

/// All packages published at one account, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRegistry {
    pub packages: Vec<PackageMetadata>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, name: &str) -> Option<&PackageMetadata> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Module names across every package, in registration then declaration order.
    pub fn all_module_names(&self) -> Vec<String> {
        self.packages.iter().flat_map(|p| p.module_names()).collect()
    }
}
