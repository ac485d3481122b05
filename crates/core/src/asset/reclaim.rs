//! Retry queue for failed asset deletions.
//!
//! Cleanup paths (orphan reconciliation, cascade delete, draft sweeping) are
//! best-effort and must never block the primary resource operation. Instead
//! of vanishing into a log line, a failed deletion lands here and is retried
//! on the next drain pass, up to a bounded number of attempts.

use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::{debug, error, warn};

use super::service::{AssetRepository, AssetStore};
use super::types::Asset;
use crate::storage::BlobStore;

#[derive(Debug, Clone)]
struct ReclaimTask {
    asset: Asset,
    attempts: u32,
}

/// Queue of assets whose deletion failed and should be retried.
#[derive(Debug)]
pub struct ReclaimQueue {
    tasks: Mutex<VecDeque<ReclaimTask>>,
    max_attempts: u32,
}

impl ReclaimQueue {
    /// Default number of delete attempts before a task is dropped.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Creates a queue with the default attempt bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_attempts(Self::DEFAULT_MAX_ATTEMPTS)
    }

    /// Creates a queue with an explicit attempt bound.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Enqueue an asset whose deletion just failed.
    pub fn push(&self, asset: Asset) {
        let mut tasks = self.tasks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        debug!(asset_id = %asset.id, key = %asset.blob_key, "asset queued for reclaim");
        tasks.push_back(ReclaimTask { asset, attempts: 1 });
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-attempt every queued deletion once.
    ///
    /// Successful deletions leave the queue; failures are re-queued with the
    /// attempt counter bumped until `max_attempts`, after which the task is
    /// dropped at error level (the retained row stays detectable in the
    /// database).
    ///
    /// Returns the number of asset rows removed in this pass.
    pub async fn drain<B, R>(&self, store: &AssetStore<B, R>) -> u64
    where
        B: BlobStore,
        R: AssetRepository,
    {
        let pending: Vec<ReclaimTask> = {
            let mut tasks = self
                .tasks
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            tasks.drain(..).collect()
        };

        let mut removed = 0;
        for mut task in pending {
            match store.delete(&task.asset).await {
                Ok(row_removed) => {
                    if row_removed {
                        removed += 1;
                    }
                    debug!(asset_id = %task.asset.id, "queued asset reclaimed");
                }
                Err(e) => {
                    task.attempts += 1;
                    if task.attempts >= self.max_attempts {
                        error!(
                            asset_id = %task.asset.id,
                            key = %task.asset.blob_key,
                            attempts = task.attempts,
                            error = %e,
                            "giving up on asset reclaim"
                        );
                    } else {
                        warn!(
                            asset_id = %task.asset.id,
                            attempts = task.attempts,
                            error = %e,
                            "asset reclaim failed, will retry"
                        );
                        let mut tasks = self
                            .tasks
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner);
                        tasks.push_back(task);
                    }
                }
            }
        }
        removed
    }
}

impl Default for ReclaimQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::asset::{AssetStore, TargetKind};
    use crate::testing::{MemoryBlobStore, MockAssetRepository, png_upload};
    use driftwood_shared::types::{ResourceId, TargetRef};

    async fn stored_asset(
        store: &AssetStore<MemoryBlobStore, MockAssetRepository>,
    ) -> crate::asset::Asset {
        store
            .upload(png_upload(
                TargetKind::Community,
                TargetRef::Persisted(ResourceId::new(1)),
            ))
            .await
            .unwrap()
            .asset
    }

    #[tokio::test]
    async fn test_drain_retries_until_success() {
        let blob = Arc::new(MemoryBlobStore::new());
        let repo = Arc::new(MockAssetRepository::new());
        let store = AssetStore::new(blob.clone(), repo.clone());
        let asset = stored_asset(&store).await;

        blob.fail_deletes_for(&asset.blob_key);
        assert!(store.delete(&asset).await.is_err());

        let queue = ReclaimQueue::new();
        queue.push(asset.clone());

        // Still failing: task stays queued.
        assert_eq!(queue.drain(&store).await, 0);
        assert_eq!(queue.len(), 1);
        assert_eq!(repo.count(), 1);

        // Storage recovered: task drains.
        blob.allow_deletes_for(&asset.blob_key);
        assert_eq!(queue.drain(&store).await, 1);
        assert!(queue.is_empty());
        assert_eq!(repo.count(), 0);
    }

    #[tokio::test]
    async fn test_drain_drops_after_max_attempts() {
        let blob = Arc::new(MemoryBlobStore::new());
        let repo = Arc::new(MockAssetRepository::new());
        let store = AssetStore::new(blob.clone(), repo.clone());
        let asset = stored_asset(&store).await;
        blob.fail_deletes_for(&asset.blob_key);

        let queue = ReclaimQueue::with_max_attempts(2);
        queue.push(asset);

        assert_eq!(queue.drain(&store).await, 0);
        // Second attempt hit the bound; the task is gone but the row remains.
        assert!(queue.is_empty());
        assert_eq!(repo.count(), 1);
    }
}
