use code_registry_types::{AccountAddress, UpgradePolicy};
use thiserror::Error;

use crate::loader::LoaderError;

/// Error category for malformed or disallowed input.
pub const INVALID_ARGUMENT: u64 = 0x1;
/// Error category for a value outside its representable range.
pub const OUT_OF_RANGE: u64 = 0x2;
/// Error category for a referenced resource that does not exist.
pub const NOT_FOUND: u64 = 0x6;

pub const EMODULE_NAME_CLASH: u64 = 0x1;
pub const EUPGRADE_IMMUTABLE: u64 = 0x2;
pub const EUPGRADE_WEAKER_POLICY: u64 = 0x3;
pub const EMODULE_MISSING: u64 = 0x4;
pub const EPACKAGE_DEP_MISSING: u64 = 0x5;
pub const EDEP_WEAKER_POLICY: u64 = 0x6;
pub const EDEP_ARBITRARY_NOT_SAME_ADDRESS: u64 = 0x7;
pub const EARBITRARY_POLICY_DISABLED: u64 = 0x8;
pub const EUPGRADE_NUMBER_OVERFLOW: u64 = 0x9;

/// Errors raised while admitting a package into a registry.
///
/// Every variant aborts the whole publish; none of them is retriable.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("module {module} is already defined by package {existing_package}")]
    ModuleNameClash {
        module: String,
        existing_package: String,
    },

    #[error("package {package} is immutable and cannot be upgraded")]
    ImmutablePackage { package: String },

    #[error("package {package} cannot weaken its upgrade policy from {from} to {to}")]
    WeakenedPolicy {
        package: String,
        from: UpgradePolicy,
        to: UpgradePolicy,
    },

    #[error("upgrade of package {package} drops module {module}")]
    ModuleMissing { package: String, module: String },

    #[error("dependency {package} not found at {account}")]
    DependencyMissing {
        account: AccountAddress,
        package: String,
    },

    #[error("dependency {dependency} has policy {dependency_policy}, weaker than {package_policy}")]
    DependencyWeakerPolicy {
        dependency: String,
        dependency_policy: UpgradePolicy,
        package_policy: UpgradePolicy,
    },

    #[error("arbitrary-policy dependency {package} at {account} must live at the publishing account")]
    ArbitraryDependencyNotSameAddress {
        account: AccountAddress,
        package: String,
    },

    #[error("package {package} declares the arbitrary upgrade policy, which is disabled")]
    ArbitraryPolicyDisabled { package: String },

    #[error("package {package} has exhausted its upgrade numbers")]
    UpgradeNumberOverflow { package: String },

    #[error("malformed package metadata: {0}")]
    MalformedMetadata(#[from] serde_json::Error),

    #[error("loader rejected publish: {0}")]
    Loader(#[from] LoaderError),
}

impl RegistryError {
    /// Category and reason of a registry abort, `None` for decode and loader failures.
    pub fn category_and_reason(&self) -> Option<(u64, u64)> {
        use RegistryError::*;
        let pair = match self {
            ModuleNameClash { .. } => (INVALID_ARGUMENT, EMODULE_NAME_CLASH),
            ImmutablePackage { .. } => (INVALID_ARGUMENT, EUPGRADE_IMMUTABLE),
            WeakenedPolicy { .. } => (INVALID_ARGUMENT, EUPGRADE_WEAKER_POLICY),
            ModuleMissing { .. } => (INVALID_ARGUMENT, EMODULE_MISSING),
            DependencyMissing { .. } => (NOT_FOUND, EPACKAGE_DEP_MISSING),
            DependencyWeakerPolicy { .. } => (INVALID_ARGUMENT, EDEP_WEAKER_POLICY),
            ArbitraryDependencyNotSameAddress { .. } => {
                (INVALID_ARGUMENT, EDEP_ARBITRARY_NOT_SAME_ADDRESS)
            }
            ArbitraryPolicyDisabled { .. } => (INVALID_ARGUMENT, EARBITRARY_POLICY_DISABLED),
            UpgradeNumberOverflow { .. } => (OUT_OF_RANGE, EUPGRADE_NUMBER_OVERFLOW),
            MalformedMetadata(_) | Loader(_) => return None,
        };
        Some(pair)
    }

    /// Canonical abort code, `(category << 16) | reason`.
    pub fn abort_code(&self) -> Option<u64> {
        self.category_and_reason()
            .map(|(category, reason)| (category << 16) | reason)
    }

    pub fn retriable(&self) -> bool {
        false
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
