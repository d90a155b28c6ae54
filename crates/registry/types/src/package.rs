//! Package and module metadata.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::address::AccountAddress;
use crate::policy::UpgradePolicy;

/// Open extension slot carried by packages and modules.
///
/// The registry stores extensions verbatim and never interprets them.
/// Records whose `kind` this version does not know are kept as raw JSON in
/// [`Extension::Unknown`] and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Extension {
    /// A typed payload, identified by the producer's type name.
    Any { type_name: String, data: Vec<u8> },
    Unknown(Value),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum KnownExtension {
    Any { type_name: String, data: Vec<u8> },
}

impl Serialize for Extension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Extension::Any { type_name, data } => KnownExtension::Any {
                type_name: type_name.clone(),
                data: data.clone(),
            }
            .serialize(serializer),
            Extension::Unknown(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Extension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let is_known = matches!(raw.get("kind").and_then(Value::as_str), Some("any"));
        if !is_known {
            return Ok(Extension::Unknown(raw));
        }
        match serde_json::from_value(raw).map_err(serde::de::Error::custom)? {
            KnownExtension::Any { type_name, data } => Ok(Extension::Any { type_name, data }),
        }
    }
}

/// Metadata for one module inside a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// Module name, unique within the owning package.
    pub name: String,
    /// Source text, possibly compressed. Opaque to the registry.
    #[serde(default)]
    pub source: Vec<u8>,
    /// Source map, possibly compressed. Opaque to the registry.
    #[serde(default)]
    pub source_map: Vec<u8>,
    #[serde(default)]
    pub extension: Option<Extension>,
}

impl ModuleMetadata {
    /// A module with only a name and empty source blobs.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Vec::new(),
            source_map: Vec::new(),
            extension: None,
        }
    }
}

/// A dependency on a package published at some account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageDep {
    pub account: AccountAddress,
    pub package_name: String,
}

impl PackageDep {
    pub fn new(account: AccountAddress, package_name: impl Into<String>) -> Self {
        Self {
            account,
            package_name: package_name.into(),
        }
    }
}

/// A module the loader may link the published code against.
///
/// An empty `module_name` is a wildcard for every module at `account`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowedDep {
    pub account: AccountAddress,
    pub module_name: String,
}

impl AllowedDep {
    pub fn wildcard(account: AccountAddress) -> Self {
        Self {
            account,
            module_name: String::new(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.module_name.is_empty()
    }
}

/// Metadata for a package, as stored in an account's registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Package name, unique within the owning registry.
    pub name: String,
    pub upgrade_policy: UpgradePolicy,
    /// Number of times this package name has been republished.
    ///
    /// Assigned by the publisher; any value supplied by the caller is
    /// overwritten.
    #[serde(default)]
    pub upgrade_number: u64,
    #[serde(default)]
    pub source_digest: String,
    /// Build manifest, possibly compressed. Opaque to the registry.
    #[serde(default)]
    pub manifest: Vec<u8>,
    #[serde(default)]
    pub modules: Vec<ModuleMetadata>,
    #[serde(default)]
    pub deps: Vec<PackageDep>,
    #[serde(default)]
    pub extension: Option<Extension>,
}

impl PackageMetadata {
    /// A package with no modules, dependencies or blobs.
    pub fn new(name: impl Into<String>, upgrade_policy: UpgradePolicy) -> Self {
        Self {
            name: name.into(),
            upgrade_policy,
            upgrade_number: 0,
            source_digest: String::new(),
            manifest: Vec::new(),
            modules: Vec::new(),
            deps: Vec::new(),
            extension: None,
        }
    }

    /// Append empty modules with the given names.
    pub fn with_modules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules
            .extend(names.into_iter().map(ModuleMetadata::named));
        self
    }

    pub fn with_dep(mut self, dep: PackageDep) -> Self {
        self.deps.push(dep);
        self
    }

    pub fn with_source_digest(mut self, digest: impl Into<String>) -> Self {
        self.source_digest = digest.into();
        self
    }

    /// Names of this package's modules, in declaration order.
    pub fn module_names(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name.clone()).collect()
    }

    pub fn is_upgradeable(&self) -> bool {
        self.upgrade_policy < UpgradePolicy::Immutable
    }
}
