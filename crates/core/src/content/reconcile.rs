//! Orphan-asset reconciliation.

use std::sync::Arc;

use driftwood_shared::types::{ResourceId, TargetRef};
use tracing::{debug, warn};

use super::scanner::ReferenceScanner;
use crate::asset::{AssetRepository, AssetStore, ReclaimQueue, TargetKind};
use crate::storage::BlobStore;

/// Compares assets on record against assets actually referenced in final
/// content and deletes the unreferenced ones.
///
/// Reconciliation is explicitly best-effort: every deletion is attempted
/// independently, failures are logged and queued for retry, and nothing here
/// ever propagates to the caller of the resource write.
pub struct Reconciler<B: BlobStore, R: AssetRepository> {
    scanner: ReferenceScanner,
    assets: Arc<AssetStore<B, R>>,
    reclaim: Arc<ReclaimQueue>,
}

impl<B: BlobStore, R: AssetRepository> Reconciler<B, R> {
    /// Create a new reconciler.
    #[must_use]
    pub fn new(
        scanner: ReferenceScanner,
        assets: Arc<AssetStore<B, R>>,
        reclaim: Arc<ReclaimQueue>,
    ) -> Self {
        Self {
            scanner,
            assets,
            reclaim,
        }
    }

    /// Drop every asset of `(kind, id)` that the content no longer references.
    ///
    /// Returns the number of asset rows removed.
    pub async fn reconcile(&self, kind: TargetKind, id: ResourceId, content: &str) -> u64 {
        let referenced = self.scanner.referenced_keys(content);

        let on_record = match self
            .assets
            .list_by_target(kind, TargetRef::Persisted(id))
            .await
        {
            Ok(assets) => assets,
            Err(e) => {
                warn!(kind = %kind, resource_id = %id, error = %e, "reconciliation skipped");
                return 0;
            }
        };

        let mut removed = 0;
        for asset in on_record {
            if referenced.contains(&asset.blob_key) {
                continue;
            }
            match self.assets.delete(&asset).await {
                Ok(true) => {
                    removed += 1;
                    debug!(asset_id = %asset.id, key = %asset.blob_key, "orphan asset reclaimed");
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(asset_id = %asset.id, error = %e, "orphan delete failed, queued for retry");
                    self.reclaim.push(asset);
                }
            }
        }

        if removed > 0 {
            debug!(kind = %kind, resource_id = %id, removed, "reconciliation complete");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryBlobStore, MockAssetRepository, png_upload};

    const BASE: &str = "https://cdn.test/media";

    struct Fixture {
        assets: Arc<AssetStore<MemoryBlobStore, MockAssetRepository>>,
        blob: Arc<MemoryBlobStore>,
        repo: Arc<MockAssetRepository>,
        reclaim: Arc<ReclaimQueue>,
        reconciler: Reconciler<MemoryBlobStore, MockAssetRepository>,
    }

    fn fixture() -> Fixture {
        let blob = Arc::new(MemoryBlobStore::new());
        let repo = Arc::new(MockAssetRepository::new());
        let assets = Arc::new(AssetStore::new(blob.clone(), repo.clone()));
        let reclaim = Arc::new(ReclaimQueue::new());
        let reconciler = Reconciler::new(
            ReferenceScanner::new(BASE),
            assets.clone(),
            reclaim.clone(),
        );
        Fixture {
            assets,
            blob,
            repo,
            reclaim,
            reconciler,
        }
    }

    #[tokio::test]
    async fn test_unreferenced_assets_are_deleted() {
        let fx = fixture();
        let id = ResourceId::new(55);
        let target = TargetRef::Persisted(id);

        let kept = fx
            .assets
            .upload(png_upload(TargetKind::Community, target))
            .await
            .unwrap();
        let orphan = fx
            .assets
            .upload(png_upload(TargetKind::Community, target))
            .await
            .unwrap();

        let content = format!("<img src=\"{}\">", kept.public_url);
        let removed = fx.reconciler.reconcile(TargetKind::Community, id, &content).await;

        assert_eq!(removed, 1);
        assert!(fx.repo.get(kept.asset.id).is_some());
        assert!(fx.repo.get(orphan.asset.id).is_none());
        assert!(!fx.blob.contains(&orphan.asset.blob_key));
    }

    #[tokio::test]
    async fn test_referenced_asset_is_never_deleted() {
        let fx = fixture();
        let id = ResourceId::new(55);

        let stored = fx
            .assets
            .upload(png_upload(TargetKind::Community, TargetRef::Persisted(id)))
            .await
            .unwrap();

        // URL verbatim in content, twice: still one reference, still kept.
        let content = format!("{url} and again {url}", url = stored.public_url);
        let removed = fx.reconciler.reconcile(TargetKind::Community, id, &content).await;

        assert_eq!(removed, 0);
        assert!(fx.repo.get(stored.asset.id).is_some());
    }

    #[tokio::test]
    async fn test_failed_delete_is_queued_not_propagated() {
        let fx = fixture();
        let id = ResourceId::new(55);

        let orphan = fx
            .assets
            .upload(png_upload(TargetKind::Community, TargetRef::Persisted(id)))
            .await
            .unwrap();
        fx.blob.fail_deletes_for(&orphan.asset.blob_key);

        let removed = fx
            .reconciler
            .reconcile(TargetKind::Community, id, "no references at all")
            .await;

        assert_eq!(removed, 0);
        // Row retained, retry queued.
        assert!(fx.repo.get(orphan.asset.id).is_some());
        assert_eq!(fx.reclaim.len(), 1);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_the_loop() {
        let fx = fixture();
        let id = ResourceId::new(55);
        let target = TargetRef::Persisted(id);

        let bad = fx
            .assets
            .upload(png_upload(TargetKind::Community, target))
            .await
            .unwrap();
        let good = fx
            .assets
            .upload(png_upload(TargetKind::Community, target))
            .await
            .unwrap();
        fx.blob.fail_deletes_for(&bad.asset.blob_key);

        let removed = fx
            .reconciler
            .reconcile(TargetKind::Community, id, "nothing referenced")
            .await;

        // The healthy orphan still went away.
        assert_eq!(removed, 1);
        assert!(fx.repo.get(good.asset.id).is_none());
        assert!(fx.repo.get(bad.asset.id).is_some());
    }
}
