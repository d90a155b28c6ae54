//! Upgrade policy lattice.
//!
//! The three levels form a total order. A package's policy may stay put or
//! move up on upgrade, never down.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared mutability contract of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum UpgradePolicy {
    /// Any change is allowed; layout compatibility is not checked downstream.
    Arbitrary = 0,
    /// Upgrades must keep storage layouts and public signatures compatible.
    Compatible = 1,
    /// The package can never be republished under the same name.
    Immutable = 2,
}

impl UpgradePolicy {
    pub const fn arbitrary() -> Self {
        Self::Arbitrary
    }

    pub const fn compatible() -> Self {
        Self::Compatible
    }

    pub const fn immutable() -> Self {
        Self::Immutable
    }

    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Whether a package holding `self` may move to `to`.
    pub fn can_change_to(self, to: UpgradePolicy) -> bool {
        self.ordinal() <= to.ordinal()
    }

    /// Whether the loader must run the structural compatibility check.
    pub fn requires_compatibility_check(self) -> bool {
        self != Self::Arbitrary
    }
}

impl Default for UpgradePolicy {
    fn default() -> Self {
        Self::Compatible
    }
}

impl TryFrom<u8> for UpgradePolicy {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Arbitrary),
            1 => Ok(Self::Compatible),
            2 => Ok(Self::Immutable),
            other => Err(format!("unknown upgrade policy ordinal {}", other)),
        }
    }
}

impl From<UpgradePolicy> for u8 {
    fn from(policy: UpgradePolicy) -> Self {
        policy.ordinal()
    }
}

impl fmt::Display for UpgradePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arbitrary => write!(f, "arbitrary"),
            Self::Compatible => write!(f, "compatible"),
            Self::Immutable => write!(f, "immutable"),
        }
    }
}
