//! Draft registry error types.

use driftwood_shared::types::DraftHandle;
use thiserror::Error;

/// Draft handle operation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    /// The handle was never registered, already consumed, or released.
    #[error("draft handle not found: {0}")]
    HandleNotFound(DraftHandle),

    /// The handle is registered to a different user.
    #[error("draft handle {0} is owned by another user")]
    NotOwner(DraftHandle),
}
