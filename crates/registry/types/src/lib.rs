//! # code-registry-types
//!
//! Data model for the per-account code registry.
//!
//! An account owns at most one [`PackageRegistry`], an ordered list of the
//! packages published at that account. Each [`PackageMetadata`] carries an
//! [`UpgradePolicy`] which only ever hardens across upgrades:
//!
//! ```text
//! Arbitrary (0) ──► Compatible (1) ──► Immutable (2)
//! ```
//!
//! Module names are unique across every package of one registry. The types in
//! this crate only describe that state; admission rules live in the
//! `code-registry` engine crate.

pub mod address;
pub mod package;
pub mod policy;
pub mod registry;

pub use address::{AccountAddress, AddressParseError};
pub use package::{AllowedDep, Extension, ModuleMetadata, PackageDep, PackageMetadata};
pub use policy::UpgradePolicy;
pub use registry::PackageRegistry;
