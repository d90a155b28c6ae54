//! Publish orchestration.
//!
//! [`PackagePublisher`] is the single entry point for putting code at an
//! account. A publish runs in two phases:
//!
//! 1. Validation: the policy switch, module-name uniqueness within the
//!    candidate, the dependency gate, then one read-only
//!    scan of the account's registry applying the upgrade gate to the entry
//!    with the same name and the coexistence gate to every other entry.
//! 2. Commit: the registry entry is appended or replaced in place, the
//!    registry is written, and the loader is asked to commit the bytecode.
//!
//! Nothing is written until validation finishes. If the loader rejects the
//! request the account's registry is restored to its prior state.

use code_registry_types::{
    AccountAddress, AllowedDep, PackageMetadata, PackageRegistry, UpgradePolicy,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::gate::{
    check_coexistence, check_dependencies, check_unique_modules, check_upgradability,
};
use crate::loader::{CodeLoader, PublishRequest};
use crate::store::RegistryStore;

/// Event recorded for every accepted publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishPackageEvent {
    pub code_address: AccountAddress,
    pub is_upgrade: bool,
}

/// Outcome of an accepted publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub owner: AccountAddress,
    pub package_name: String,
    pub upgrade_number: u64,
    pub policy: UpgradePolicy,
    pub event: PublishPackageEvent,
}

/// Result of the validation phase.
struct Admission {
    registry_before: Option<PackageRegistry>,
    /// Index of the entry being upgraded, `None` for a new package.
    index: Option<usize>,
    upgrade_number: u64,
    allowed_deps: Vec<AllowedDep>,
}

/// Admits packages into per-account registries and hands them to the loader.
pub struct PackagePublisher<S, L> {
    store: S,
    loader: L,
    config: RegistryConfig,
}

impl<S: RegistryStore, L: CodeLoader> PackagePublisher<S, L> {
    pub fn new(store: S, loader: L) -> Self {
        Self::with_config(store, loader, RegistryConfig::default())
    }

    pub fn with_config(store: S, loader: L, config: RegistryConfig) -> Self {
        Self {
            store,
            loader,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The registry at `owner`, if anything was ever published there.
    pub fn registry(&self, owner: &AccountAddress) -> Option<PackageRegistry> {
        self.store.get(owner)
    }

    /// Decode JSON package metadata and publish it.
    pub fn publish_package_serialized(
        &self,
        owner: AccountAddress,
        metadata: &[u8],
        code: Vec<Vec<u8>>,
    ) -> Result<PublishReceipt> {
        let package: PackageMetadata = serde_json::from_slice(metadata)?;
        self.publish_package(owner, package, code)
    }

    /// Publish `package` with bytecode `code` at `owner`.
    ///
    /// The caller's `upgrade_number` is discarded and recomputed.
    pub fn publish_package(
        &self,
        owner: AccountAddress,
        mut package: PackageMetadata,
        code: Vec<Vec<u8>>,
    ) -> Result<PublishReceipt> {
        let Admission {
            registry_before,
            index,
            upgrade_number,
            allowed_deps,
        } = match self.admit(&owner, &package) {
            Ok(admission) => admission,
            Err(err) => {
                warn!(owner = %owner, package = %package.name, error = %err, "publish rejected");
                return Err(err);
            }
        };

        let module_names = package.module_names();
        let policy = package.upgrade_policy;
        let package_name = package.name.clone();
        package.upgrade_number = upgrade_number;

        let mut registry = registry_before.clone().unwrap_or_default();
        match index {
            Some(i) => registry.packages[i] = package,
            None => registry.packages.push(package),
        }
        self.store.put(owner, registry);

        let event = PublishPackageEvent {
            code_address: owner,
            is_upgrade: upgrade_number > 0,
        };

        let request = PublishRequest {
            owner,
            module_names,
            allowed_deps: self.config.dependency_checks.then_some(allowed_deps),
            code,
            policy: policy.ordinal(),
        };

        if let Err(err) = self.loader.request_publish(request) {
            warn!(owner = %owner, package = %package_name, error = %err, "loader rejected publish, restoring registry");
            match registry_before {
                Some(previous) => self.store.put(owner, previous),
                None => {
                    self.store.remove(&owner);
                }
            }
            return Err(err.into());
        }

        info!(
            owner = %owner,
            package = %package_name,
            upgrade_number,
            policy = %policy,
            compatibility_check = policy.requires_compatibility_check(),
            is_upgrade = event.is_upgrade,
            "package published"
        );

        Ok(PublishReceipt {
            owner,
            package_name,
            upgrade_number,
            policy,
            event,
        })
    }

    /// Validation phase. Reads only.
    fn admit(&self, owner: &AccountAddress, package: &PackageMetadata) -> Result<Admission> {
        if !self.config.allow_arbitrary_policy && package.upgrade_policy == UpgradePolicy::Arbitrary
        {
            return Err(RegistryError::ArbitraryPolicyDisabled {
                package: package.name.clone(),
            });
        }

        check_unique_modules(package)?;

        let allowed_deps = if self.config.dependency_checks {
            check_dependencies(owner, package, &self.store, &self.config)?
        } else {
            Vec::new()
        };

        let new_module_names = package.module_names();
        let registry_before = self.store.get(owner);

        let mut index = None;
        let mut upgrade_number = 0;
        if let Some(registry) = &registry_before {
            for (i, old) in registry.packages.iter().enumerate() {
                if old.name == package.name {
                    check_upgradability(old, package, &new_module_names)?;
                    upgrade_number = old.upgrade_number.checked_add(1).ok_or_else(|| {
                        RegistryError::UpgradeNumberOverflow {
                            package: old.name.clone(),
                        }
                    })?;
                    index = Some(i);
                } else {
                    check_coexistence(old, &new_module_names)?;
                }
            }
        }

        Ok(Admission {
            registry_before,
            index,
            upgrade_number,
            allowed_deps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{LoaderError, RecordingLoader};
    use crate::store::InMemoryRegistryStore;

    fn publisher() -> PackagePublisher<InMemoryRegistryStore, RecordingLoader> {
        PackagePublisher::new(InMemoryRegistryStore::new(), RecordingLoader::new())
    }

    fn pkg(name: &str, policy: UpgradePolicy, modules: &[&str]) -> PackageMetadata {
        PackageMetadata::new(name, policy).with_modules(modules.iter().copied())
    }

    fn alice() -> AccountAddress {
        AccountAddress::from_u64(0xa11ce)
    }

    #[test]
    fn first_publish_creates_registry() {
        let publisher = publisher();
        assert!(publisher.registry(&alice()).is_none());

        let receipt = publisher
            .publish_package(alice(), pkg("P", UpgradePolicy::Compatible, &["m1"]), vec![vec![1]])
            .unwrap();
        assert_eq!(receipt.upgrade_number, 0);
        assert!(!receipt.event.is_upgrade);

        let registry = publisher.registry(&alice()).unwrap();
        assert_eq!(registry.packages.len(), 1);
        assert_eq!(registry.packages[0].name, "P");
    }

    #[test]
    fn caller_upgrade_number_is_overwritten() {
        let publisher = publisher();
        let mut package = pkg("P", UpgradePolicy::Compatible, &["m1"]);
        package.upgrade_number = 41;

        let receipt = publisher.publish_package(alice(), package, vec![]).unwrap();
        assert_eq!(receipt.upgrade_number, 0);
        assert_eq!(
            publisher.registry(&alice()).unwrap().packages[0].upgrade_number,
            0
        );
    }

    #[test]
    fn upgrade_replaces_entry_in_place() {
        let publisher = publisher();
        publisher
            .publish_package(alice(), pkg("A", UpgradePolicy::Compatible, &["a"]), vec![])
            .unwrap();
        publisher
            .publish_package(alice(), pkg("B", UpgradePolicy::Compatible, &["b"]), vec![])
            .unwrap();
        let receipt = publisher
            .publish_package(alice(), pkg("A", UpgradePolicy::Immutable, &["a", "a2"]), vec![])
            .unwrap();
        assert_eq!(receipt.upgrade_number, 1);
        assert!(receipt.event.is_upgrade);

        let registry = publisher.registry(&alice()).unwrap();
        let order: Vec<_> = registry.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
        assert_eq!(registry.packages[0].upgrade_policy, UpgradePolicy::Immutable);
        assert_eq!(registry.packages[0].module_names(), vec!["a", "a2"]);
    }

    #[test]
    fn loader_request_carries_names_code_and_policy() {
        let publisher = publisher();
        publisher
            .publish_package(
                alice(),
                pkg("P", UpgradePolicy::Immutable, &["m2", "m1"]),
                vec![vec![0xde], vec![0xad]],
            )
            .unwrap();

        let request = publisher.loader().last_request().unwrap();
        assert_eq!(request.owner, alice());
        assert_eq!(request.module_names, vec!["m2", "m1"]);
        assert_eq!(request.code, vec![vec![0xde], vec![0xad]]);
        assert_eq!(request.policy, 2);
        assert_eq!(request.allowed_deps, Some(vec![]));
    }

    #[test]
    fn no_allowed_deps_when_dependency_checks_disabled() {
        let config = RegistryConfig {
            dependency_checks: false,
            ..RegistryConfig::default()
        };
        let publisher =
            PackagePublisher::with_config(InMemoryRegistryStore::new(), RecordingLoader::new(), config);
        publisher
            .publish_package(alice(), pkg("P", UpgradePolicy::Compatible, &["m"]), vec![])
            .unwrap();
        assert_eq!(publisher.loader().last_request().unwrap().allowed_deps, None);
    }

    #[test]
    fn gate_failure_on_fresh_account_leaves_no_registry() {
        let config = RegistryConfig {
            allow_arbitrary_policy: false,
            ..RegistryConfig::default()
        };
        let publisher =
            PackagePublisher::with_config(InMemoryRegistryStore::new(), RecordingLoader::new(), config);

        let err = publisher
            .publish_package(alice(), pkg("P", UpgradePolicy::Arbitrary, &["m"]), vec![])
            .unwrap_err();
        assert!(matches!(err, RegistryError::ArbitraryPolicyDisabled { .. }));
        assert!(publisher.registry(&alice()).is_none());
        assert!(publisher.loader().requests().is_empty());
    }

    #[test]
    fn loader_failure_restores_previous_registry() {
        let publisher = publisher();
        publisher
            .publish_package(alice(), pkg("P", UpgradePolicy::Compatible, &["m1"]), vec![])
            .unwrap();
        let before = publisher.registry(&alice());

        publisher.loader().fail_next(LoaderError::Incompatible {
            module: "m1".into(),
            reason: "struct layout changed".into(),
        });
        let err = publisher
            .publish_package(alice(), pkg("P", UpgradePolicy::Compatible, &["m1", "m2"]), vec![])
            .unwrap_err();
        assert!(matches!(err, RegistryError::Loader(_)));
        assert_eq!(publisher.registry(&alice()), before);
    }

    #[test]
    fn loader_failure_on_first_publish_removes_registry() {
        let publisher = publisher();
        publisher
            .loader()
            .fail_next(LoaderError::Verification("bad magic".into()));
        assert!(publisher
            .publish_package(alice(), pkg("P", UpgradePolicy::Compatible, &["m1"]), vec![])
            .is_err());
        assert!(!publisher.store().contains(&alice()));
    }

    #[test]
    fn duplicate_module_names_are_rejected() {
        let publisher = publisher();
        let err = publisher
            .publish_package(alice(), pkg("P", UpgradePolicy::Compatible, &["m1", "m1"]), vec![])
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::ModuleNameClash { ref module, ref existing_package }
                if module == "m1" && existing_package == "P"
        ));
        assert!(publisher.registry(&alice()).is_none());
        assert!(publisher.loader().requests().is_empty());
    }

    #[test]
    fn exhausted_upgrade_number_is_rejected() {
        let publisher = publisher();
        let mut stored = pkg("P", UpgradePolicy::Compatible, &["m1"]);
        stored.upgrade_number = u64::MAX;
        let registry = PackageRegistry {
            packages: vec![stored],
        };
        publisher.store().put(alice(), registry.clone());

        let err = publisher
            .publish_package(alice(), pkg("P", UpgradePolicy::Compatible, &["m1"]), vec![])
            .unwrap_err();
        assert!(matches!(err, RegistryError::UpgradeNumberOverflow { .. }));
        assert_eq!(publisher.registry(&alice()), Some(registry));
        assert!(publisher.loader().requests().is_empty());
    }

    #[test]
    fn unknown_extension_survives_publish() {
        let publisher = publisher();
        let extension = serde_json::json!({"kind": "future", "payload": [1, 2, 3]});
        let metadata = serde_json::json!({
            "name": "P",
            "upgrade_policy": 1,
            "modules": [{"name": "m1", "extension": {"kind": "module_future", "flags": 7}}],
            "extension": extension,
        });
        publisher
            .publish_package_serialized(alice(), metadata.to_string().as_bytes(), vec![])
            .unwrap();

        let stored = publisher.registry(&alice()).unwrap().packages.remove(0);
        assert_eq!(serde_json::to_value(&stored.extension).unwrap(), extension);
        assert_eq!(
            serde_json::to_value(&stored.modules[0].extension).unwrap(),
            serde_json::json!({"kind": "module_future", "flags": 7})
        );

        let reserialized = serde_json::to_vec(&stored).unwrap();
        let decoded: PackageMetadata = serde_json::from_slice(&reserialized).unwrap();
        assert_eq!(decoded, stored);
    }

    #[test]
    fn serialized_metadata_is_decoded() {
        let publisher = publisher();
        let metadata = br#"{"name":"P","upgrade_policy":1,"upgrade_number":9,"modules":[{"name":"m1"}]}"#;
        let receipt = publisher
            .publish_package_serialized(alice(), metadata, vec![vec![1]])
            .unwrap();
        assert_eq!(receipt.package_name, "P");
        assert_eq!(receipt.upgrade_number, 0);
    }

    #[test]
    fn malformed_metadata_changes_nothing() {
        let publisher = publisher();
        let err = publisher
            .publish_package_serialized(alice(), b"{not json", vec![])
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedMetadata(_)));
        assert!(publisher.registry(&alice()).is_none());
    }
}
