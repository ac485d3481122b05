//! Draft handle allocation.

use std::sync::atomic::{AtomicI64, Ordering};

use driftwood_shared::types::DraftHandle;

/// Produces unique placeholder handles for not-yet-persisted resources.
///
/// The counter is seeded from the current unix-millis timestamp and
/// incremented atomically per allocation, then negated, so handles are unique
/// under arbitrary concurrency within one process while staying in the same
/// numeric id space as persisted resource ids.
#[derive(Debug)]
pub struct HandleAllocator {
    next: AtomicI64,
}

impl HandleAllocator {
    /// Creates an allocator seeded from the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(chrono::Utc::now().timestamp_millis())
    }

    /// Creates an allocator with an explicit starting counter value.
    ///
    /// Seeds below 1 are clamped so the negated counter is always negative.
    #[must_use]
    pub fn starting_at(seed: i64) -> Self {
        Self {
            next: AtomicI64::new(seed.max(1)),
        }
    }

    /// Returns a fresh handle.
    pub fn allocate(&self) -> DraftHandle {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        DraftHandle::from_raw(-raw).expect("allocator counter stays positive")
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_negative() {
        let allocator = HandleAllocator::new();
        assert!(allocator.allocate().into_inner() < 0);
    }

    #[test]
    fn test_allocate_is_unique_sequentially() {
        let allocator = HandleAllocator::starting_at(1_700_000_000_000);
        let first = allocator.allocate();
        let second = allocator.allocate();
        assert_eq!(first.into_inner(), -1_700_000_000_000);
        assert_eq!(second.into_inner(), -1_700_000_000_001);
    }

    #[test]
    fn test_allocate_is_unique_under_concurrency() {
        let allocator = std::sync::Arc::new(HandleAllocator::starting_at(1));
        let mut handles = Vec::new();

        std::thread::scope(|scope| {
            let mut joins = Vec::new();
            for _ in 0..8 {
                let allocator = allocator.clone();
                joins.push(scope.spawn(move || {
                    (0..100).map(|_| allocator.allocate()).collect::<Vec<_>>()
                }));
            }
            for join in joins {
                handles.extend(join.join().unwrap());
            }
        });

        let unique: std::collections::HashSet<_> =
            handles.iter().map(|h| h.into_inner()).collect();
        assert_eq!(unique.len(), 800);
    }

    #[test]
    fn test_non_positive_seed_is_clamped() {
        let allocator = HandleAllocator::starting_at(-5);
        assert_eq!(allocator.allocate().into_inner(), -1);
    }
}
