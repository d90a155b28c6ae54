//! Per-account registry storage.
//!
//! The store holds exactly one [`PackageRegistry`] per account. It does no
//! transaction-level locking; the hosting environment guarantees exclusive
//! access to an account for the duration of a publish.

use code_registry_types::{AccountAddress, PackageRegistry};
use dashmap::DashMap;

/// Keyed store from account to that account's registry.
pub trait RegistryStore: Send + Sync {
    fn get(&self, owner: &AccountAddress) -> Option<PackageRegistry>;

    fn contains(&self, owner: &AccountAddress) -> bool {
        self.get(owner).is_some()
    }

    /// Insert or replace the registry for `owner`.
    fn put(&self, owner: AccountAddress, registry: PackageRegistry);

    fn remove(&self, owner: &AccountAddress) -> Option<PackageRegistry>;
}

/// In-memory store, one map entry per account.
#[derive(Default)]
pub struct InMemoryRegistryStore {
    registries: DashMap<AccountAddress, PackageRegistry>,
}

impl InMemoryRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts holding a registry.
    pub fn account_count(&self) -> usize {
        self.registries.len()
    }
}

impl RegistryStore for InMemoryRegistryStore {
    fn get(&self, owner: &AccountAddress) -> Option<PackageRegistry> {
        self.registries.get(owner).map(|r| r.clone())
    }

    fn contains(&self, owner: &AccountAddress) -> bool {
        self.registries.contains_key(owner)
    }

    fn put(&self, owner: AccountAddress, registry: PackageRegistry) {
        self.registries.insert(owner, registry);
    }

    fn remove(&self, owner: &AccountAddress) -> Option<PackageRegistry> {
        self.registries.remove(owner).map(|(_, r)| r)
    }
}

impl<S: RegistryStore + ?Sized> RegistryStore for &S {
    fn get(&self, owner: &AccountAddress) -> Option<PackageRegistry> {
        (**self).get(owner)
    }

    fn contains(&self, owner: &AccountAddress) -> bool {
        (**self).contains(owner)
    }

    fn put(&self, owner: AccountAddress, registry: PackageRegistry) {
        (**self).put(owner, registry)
    }

    fn remove(&self, owner: &AccountAddress) -> Option<PackageRegistry> {
        (**self).remove(owner)
    }
}
