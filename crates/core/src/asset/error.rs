//! Asset error types.

use driftwood_shared::types::AssetId;
use thiserror::Error;

use crate::storage::StorageError;

/// Asset operation errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Asset not found.
    #[error("asset not found: {0}")]
    NotFound(AssetId),

    /// Unknown target kind tag.
    #[error("unknown target kind: {0}")]
    UnknownTargetKind(String),

    /// Blob storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl AssetError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: AssetId) -> Self {
        Self::NotFound(id)
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
