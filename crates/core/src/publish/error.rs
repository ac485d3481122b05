//! Publish error types.

use driftwood_shared::types::ResourceId;
use thiserror::Error;

use crate::asset::AssetError;
use crate::draft::DraftError;

/// Errors surfaced by the finalization orchestrator.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Draft handle validation failed.
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// Asset operation failed on the primary path.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Post not found.
    #[error("post not found: {0}")]
    PostNotFound(ResourceId),

    /// Request failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl PublishError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
