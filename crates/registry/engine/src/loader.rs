//! Loader capability.
//!
//! The loader verifies and commits bytecode. The registry only tells it which
//! modules to expect, what they may link against, and which upgrade policy
//! governs the structural compatibility check.

use std::sync::Mutex;

use code_registry_types::{AccountAddress, AllowedDep};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    #[error("module {module} is incompatible with its previous version: {reason}")]
    Incompatible { module: String, reason: String },

    #[error("linking failed: {0}")]
    Linking(String),

    #[error("bytecode verification failed: {0}")]
    Verification(String),
}

/// Request handed to the loader once the registry admits a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub owner: AccountAddress,
    /// Names the bytecode bundle must define, in package order.
    pub module_names: Vec<String>,
    /// Present when dependency checks are enabled.
    pub allowed_deps: Option<Vec<AllowedDep>>,
    pub code: Vec<Vec<u8>>,
    /// Upgrade policy ordinal; 0 skips the compatibility check.
    pub policy: u8,
}

/// Commits bytecode on behalf of the registry.
pub trait CodeLoader: Send + Sync {
    fn request_publish(&self, request: PublishRequest) -> Result<(), LoaderError>;
}

impl<L: CodeLoader + ?Sized> CodeLoader for &L {
    fn request_publish(&self, request: PublishRequest) -> Result<(), LoaderError> {
        (**self).request_publish(request)
    }
}

/// Loader that records every request and can be primed to fail.
///
/// Useful for hosts that commit code out of band, and for tests.
#[derive(Default)]
pub struct RecordingLoader {
    requests: Mutex<Vec<PublishRequest>>,
    next_failure: Mutex<Option<LoaderError>>,
}

impl RecordingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next request with `error`.
    pub fn fail_next(&self, error: LoaderError) {
        *self.next_failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    /// Requests accepted so far.
    pub fn requests(&self) -> Vec<PublishRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last_request(&self) -> Option<PublishRequest> {
        self.requests().pop()
    }
}

impl CodeLoader for RecordingLoader {
    fn request_publish(&self, request: PublishRequest) -> Result<(), LoaderError> {
        if let Some(error) = self
            .next_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            return Err(error);
        }
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        Ok(())
    }
}
