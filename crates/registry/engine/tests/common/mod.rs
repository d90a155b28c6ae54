#![allow(dead_code)]

use code_registry::{
    AccountAddress, InMemoryRegistryStore, PackageMetadata, PackagePublisher, RecordingLoader,
    RegistryConfig, UpgradePolicy,
};

pub type TestPublisher = PackagePublisher<InMemoryRegistryStore, RecordingLoader>;

/// Install a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn publisher() -> TestPublisher {
    init_tracing();
    PackagePublisher::new(InMemoryRegistryStore::new(), RecordingLoader::new())
}

pub fn publisher_with(config: RegistryConfig) -> TestPublisher {
    init_tracing();
    PackagePublisher::with_config(InMemoryRegistryStore::new(), RecordingLoader::new(), config)
}

pub fn pkg(name: &str, policy: UpgradePolicy, modules: &[&str]) -> PackageMetadata {
    PackageMetadata::new(name, policy).with_modules(modules.iter().copied())
}

pub fn account(n: u64) -> AccountAddress {
    AccountAddress::from_u64(n)
}
