//! Admission gates.
//!
//! Each gate inspects one existing package (or one declared dependency)
//! against the candidate and either passes or returns the abort reason.
//! Gates never mutate state.

use std::collections::HashSet;

use code_registry_types::{AccountAddress, AllowedDep, PackageMetadata, UpgradePolicy};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::store::RegistryStore;

/// Gate for republishing a package under an existing name.
///
/// Checks run in a fixed order: immutability, policy weakening, then module
/// coverage. Passing only grants policy permission; the structural
/// compatibility check is left to the loader.
pub fn check_upgradability(
    old: &PackageMetadata,
    new: &PackageMetadata,
    new_module_names: &[String],
) -> Result<()> {
    if !old.is_upgradeable() {
        return Err(RegistryError::ImmutablePackage {
            package: old.name.clone(),
        });
    }

    if !old.upgrade_policy.can_change_to(new.upgrade_policy) {
        return Err(RegistryError::WeakenedPolicy {
            package: old.name.clone(),
            from: old.upgrade_policy,
            to: new.upgrade_policy,
        });
    }

    if let Some(dropped) = old
        .modules
        .iter()
        .find(|m| !new_module_names.contains(&m.name))
    {
        return Err(RegistryError::ModuleMissing {
            package: old.name.clone(),
            module: dropped.name.clone(),
        });
    }

    debug!(package = %old.name, from = %old.upgrade_policy, to = %new.upgrade_policy, "upgrade admitted");
    Ok(())
}

/// Gate on the candidate alone: its module names must be distinct.
pub fn check_unique_modules(package: &PackageMetadata) -> Result<()> {
    let mut seen = HashSet::new();
    if let Some(duplicate) = package
        .modules
        .iter()
        .find(|m| !seen.insert(m.name.as_str()))
    {
        return Err(RegistryError::ModuleNameClash {
            module: duplicate.name.clone(),
            existing_package: package.name.clone(),
        });
    }
    Ok(())
}

/// Gate for a package whose name differs from the candidate's.
pub fn check_coexistence(old: &PackageMetadata, new_module_names: &[String]) -> Result<()> {
    if let Some(clash) = old
        .modules
        .iter()
        .find(|m| new_module_names.contains(&m.name))
    {
        return Err(RegistryError::ModuleNameClash {
            module: clash.name.clone(),
            existing_package: old.name.clone(),
        });
    }
    Ok(())
}

/// Validate the candidate's declared dependencies.
///
/// Returns the modules the loader may link the candidate against. Reads see
/// every registry as it was before this publish.
pub fn check_dependencies<S: RegistryStore + ?Sized>(
    publisher: &AccountAddress,
    package: &PackageMetadata,
    store: &S,
    config: &RegistryConfig,
) -> Result<Vec<AllowedDep>> {
    let mut allowed = Vec::new();

    for dep in &package.deps {
        let missing = || RegistryError::DependencyMissing {
            account: dep.account,
            package: dep.package_name.clone(),
        };

        let registry = store.get(&dep.account).ok_or_else(missing)?;

        if config.is_policy_exempt(&dep.account) {
            debug!(account = %dep.account, package = %dep.package_name, "exempt dependency");
            allowed.push(AllowedDep::wildcard(dep.account));
            continue;
        }

        let dep_pack = registry.find(&dep.package_name).ok_or_else(missing)?;

        if dep_pack.upgrade_policy < package.upgrade_policy {
            return Err(RegistryError::DependencyWeakerPolicy {
                dependency: dep_pack.name.clone(),
                dependency_policy: dep_pack.upgrade_policy,
                package_policy: package.upgrade_policy,
            });
        }

        if dep_pack.upgrade_policy == UpgradePolicy::Arbitrary && dep.account != *publisher {
            return Err(RegistryError::ArbitraryDependencyNotSameAddress {
                account: dep.account,
                package: dep_pack.name.clone(),
            });
        }

        allowed.extend(dep_pack.modules.iter().map(|m| AllowedDep {
            account: dep.account,
            module_name: m.name.clone(),
        }));
    }

    Ok(allowed)
}
