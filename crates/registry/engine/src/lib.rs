//! # code-registry
//!
//! Admission policy and publish orchestration for account-scoped code
//! packages.
//!
//! Every publish at an account passes through [`PackagePublisher`], which
//! decides whether the candidate may replace or coexist with what is already
//! installed there, assigns its upgrade number, updates the account's
//! [`PackageRegistry`] and finally asks the injected [`CodeLoader`] to commit
//! the bytecode.
//!
//! ## Gates
//!
//! - **Upgrade gate** ([`check_upgradability`]) — same package name: the old
//!   package must not be immutable, the policy must not weaken, and no module
//!   may be dropped.
//! - **Coexistence gate** ([`check_coexistence`]) — different package name:
//!   no module name may be shared.
//! - **Uniqueness gate** ([`check_unique_modules`]) — no module name may
//!   appear twice within the candidate.
//! - **Dependency gate** ([`check_dependencies`]) — declared dependencies must
//!   exist and be at least as strict as the candidate.
//!
//! The structural compatibility of the bytecode itself is the loader's job;
//! the registry only passes the policy that decides whether it runs.
//!
//! ## Example
//!
//! ```
//! use code_registry::{
//!     AccountAddress, InMemoryRegistryStore, PackageMetadata, PackagePublisher, RecordingLoader,
//!     UpgradePolicy,
//! };
//!
//! let publisher = PackagePublisher::new(InMemoryRegistryStore::new(), RecordingLoader::new());
//! let owner = AccountAddress::from_u64(0xa11ce);
//! let package = PackageMetadata::new("P", UpgradePolicy::Compatible).with_modules(["m1"]);
//!
//! let receipt = publisher.publish_package(owner, package, vec![vec![0xa1, 0x1c]]).unwrap();
//! assert_eq!(receipt.upgrade_number, 0);
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod loader;
pub mod publisher;
pub mod store;

pub use code_registry_types::{
    AccountAddress, AllowedDep, Extension, ModuleMetadata, PackageDep, PackageMetadata,
    PackageRegistry, UpgradePolicy,
};
pub use config::{ConfigError, RegistryConfig};
pub use error::{RegistryError, Result};
pub use gate::{
    check_coexistence, check_dependencies, check_unique_modules, check_upgradability,
};
pub use loader::{CodeLoader, LoaderError, PublishRequest, RecordingLoader};
pub use publisher::{PackagePublisher, PublishPackageEvent, PublishReceipt};
pub use store::{InMemoryRegistryStore, RegistryStore};
