//! Draft ownership registry.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use driftwood_shared::types::{DraftHandle, UserId};

use super::error::DraftError;

/// Tracks which user owns each outstanding draft handle.
///
/// Injectable so a multi-instance deployment can swap the in-process map for
/// a shared cache; the orchestrator only sees this trait.
pub trait DraftRegistry: Send + Sync {
    /// Registers a freshly allocated handle to its owner.
    fn register(&self, handle: DraftHandle, owner: UserId);

    /// Read-only ownership check.
    ///
    /// # Errors
    ///
    /// `HandleNotFound` for an unknown handle, `NotOwner` when the caller is
    /// not the registered owner.
    fn validate(&self, handle: DraftHandle, caller: UserId) -> Result<(), DraftError>;

    /// Atomically removes the handle if the caller owns it, returning the
    /// previous owner.
    ///
    /// At most one caller can consume a given handle; a concurrent second
    /// consume observes `HandleNotFound`.
    ///
    /// # Errors
    ///
    /// `HandleNotFound` for an unknown or already-consumed handle, `NotOwner`
    /// when the caller is not the registered owner (the entry stays put).
    fn consume(&self, handle: DraftHandle, caller: UserId) -> Result<UserId, DraftError>;

    /// Removes the handle; no-op when already absent.
    fn release(&self, handle: DraftHandle);

    /// Snapshot of handles registered longer than `ttl` before `now`.
    fn expired(&self, ttl: Duration, now: DateTime<Utc>) -> Vec<(DraftHandle, UserId)>;
}

#[derive(Debug, Clone, Copy)]
struct DraftEntry {
    owner: UserId,
    registered_at: DateTime<Utc>,
}

/// Process-local registry backed by a concurrent map, so unrelated handles
/// never contend.
#[derive(Debug, Default)]
pub struct InMemoryDraftRegistry {
    entries: DashMap<DraftHandle, DraftEntry>,
}

impl InMemoryDraftRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no handles are outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn register_at(&self, handle: DraftHandle, owner: UserId, at: DateTime<Utc>) {
        self.entries.insert(
            handle,
            DraftEntry {
                owner,
                registered_at: at,
            },
        );
    }
}

impl DraftRegistry for InMemoryDraftRegistry {
    fn register(&self, handle: DraftHandle, owner: UserId) {
        self.entries.insert(
            handle,
            DraftEntry {
                owner,
                registered_at: Utc::now(),
            },
        );
    }

    fn validate(&self, handle: DraftHandle, caller: UserId) -> Result<(), DraftError> {
        let entry = self
            .entries
            .get(&handle)
            .ok_or(DraftError::HandleNotFound(handle))?;
        if entry.owner == caller {
            Ok(())
        } else {
            Err(DraftError::NotOwner(handle))
        }
    }

    fn consume(&self, handle: DraftHandle, caller: UserId) -> Result<UserId, DraftError> {
        if let Some((_, entry)) = self.entries.remove_if(&handle, |_, e| e.owner == caller) {
            return Ok(entry.owner);
        }
        // remove_if declined: either the owner differs or the entry is gone.
        if self.entries.contains_key(&handle) {
            Err(DraftError::NotOwner(handle))
        } else {
            Err(DraftError::HandleNotFound(handle))
        }
    }

    fn release(&self, handle: DraftHandle) {
        self.entries.remove(&handle);
    }

    fn expired(&self, ttl: Duration, now: DateTime<Utc>) -> Vec<(DraftHandle, UserId)> {
        self.entries
            .iter()
            .filter(|entry| now - entry.registered_at >= ttl)
            .map(|entry| (*entry.key(), entry.owner))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(raw: i64) -> DraftHandle {
        DraftHandle::from_raw(raw).expect("negative test handle")
    }

    #[test]
    fn test_validate_known_handle() {
        let registry = InMemoryDraftRegistry::new();
        registry.register(handle(-1), UserId::new(10));

        assert_eq!(registry.validate(handle(-1), UserId::new(10)), Ok(()));
    }

    #[test]
    fn test_validate_unknown_handle_is_not_found() {
        let registry = InMemoryDraftRegistry::new();

        assert_eq!(
            registry.validate(handle(-99), UserId::new(10)),
            Err(DraftError::HandleNotFound(handle(-99)))
        );
    }

    #[test]
    fn test_validate_wrong_owner_is_distinct_error() {
        let registry = InMemoryDraftRegistry::new();
        registry.register(handle(-1), UserId::new(10));

        assert_eq!(
            registry.validate(handle(-1), UserId::new(11)),
            Err(DraftError::NotOwner(handle(-1)))
        );
    }

    #[test]
    fn test_consume_returns_owner_and_removes() {
        let registry = InMemoryDraftRegistry::new();
        registry.register(handle(-1), UserId::new(10));

        assert_eq!(
            registry.consume(handle(-1), UserId::new(10)),
            Ok(UserId::new(10))
        );
        // Second consume observes not-found, never a second success.
        assert_eq!(
            registry.consume(handle(-1), UserId::new(10)),
            Err(DraftError::HandleNotFound(handle(-1)))
        );
    }

    #[test]
    fn test_consume_by_non_owner_leaves_entry() {
        let registry = InMemoryDraftRegistry::new();
        registry.register(handle(-1), UserId::new(10));

        assert_eq!(
            registry.consume(handle(-1), UserId::new(11)),
            Err(DraftError::NotOwner(handle(-1)))
        );
        // The rightful owner can still consume.
        assert_eq!(
            registry.consume(handle(-1), UserId::new(10)),
            Ok(UserId::new(10))
        );
    }

    #[test]
    fn test_release_is_idempotent() {
        let registry = InMemoryDraftRegistry::new();
        registry.register(handle(-1), UserId::new(10));

        registry.release(handle(-1));
        registry.release(handle(-1));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_consume_winner_takes_all_under_concurrency() {
        let registry = std::sync::Arc::new(InMemoryDraftRegistry::new());
        registry.register(handle(-7), UserId::new(10));

        let mut successes = 0;
        std::thread::scope(|scope| {
            let joins: Vec<_> = (0..16)
                .map(|_| {
                    let registry = registry.clone();
                    scope.spawn(move || registry.consume(handle(-7), UserId::new(10)).is_ok())
                })
                .collect();
            for join in joins {
                if join.join().unwrap() {
                    successes += 1;
                }
            }
        });

        assert_eq!(successes, 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_expired_snapshot() {
        let registry = InMemoryDraftRegistry::new();
        let now = Utc::now();
        registry.register_at(handle(-1), UserId::new(10), now - Duration::hours(25));
        registry.register_at(handle(-2), UserId::new(11), now - Duration::hours(1));

        let expired = registry.expired(Duration::hours(24), now);
        assert_eq!(expired, vec![(handle(-1), UserId::new(10))]);
    }
}
