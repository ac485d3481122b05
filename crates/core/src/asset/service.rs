//! Asset store implementation.

use std::sync::Arc;

use driftwood_shared::types::{AssetId, DraftHandle, TargetRef};
use tracing::{debug, warn};

use super::error::AssetError;
use super::types::{Asset, NewAssetRecord, StoredAsset, TargetKind, UploadInput};
use crate::storage::{BlobStore, StorageError, generate_blob_key};

/// Repository trait for asset persistence.
///
/// This trait is implemented by the db crate to provide actual database
/// operations.
pub trait AssetRepository: Send + Sync {
    /// Create a new asset record.
    fn insert(
        &self,
        record: NewAssetRecord,
    ) -> impl std::future::Future<Output = Result<Asset, AssetError>> + Send;

    /// Find asset by ID.
    fn find_by_id(
        &self,
        id: AssetId,
    ) -> impl std::future::Future<Output = Result<Option<Asset>, AssetError>> + Send;

    /// List assets attached to one target.
    fn list_by_target(
        &self,
        kind: TargetKind,
        target: TargetRef,
    ) -> impl std::future::Future<Output = Result<Vec<Asset>, AssetError>> + Send;

    /// List assets staged under a draft handle, across all target kinds.
    fn list_staged(
        &self,
        handle: DraftHandle,
    ) -> impl std::future::Future<Output = Result<Vec<Asset>, AssetError>> + Send;

    /// Bulk-rewrite the target of every asset matching `(kind, from)` to
    /// `to`, returning the number of rows moved. Rows outside the matched
    /// set are untouched.
    fn retarget(
        &self,
        kind: TargetKind,
        from: TargetRef,
        to: TargetRef,
    ) -> impl std::future::Future<Output = Result<u64, AssetError>> + Send;

    /// Remove a single metadata row; returns whether a row was removed.
    fn delete_row(
        &self,
        id: AssetId,
    ) -> impl std::future::Future<Output = Result<bool, AssetError>> + Send;
}

/// Asset store composing blob storage and metadata persistence.
pub struct AssetStore<B: BlobStore, R: AssetRepository> {
    blob: Arc<B>,
    repo: Arc<R>,
}

impl<B: BlobStore, R: AssetRepository> AssetStore<B, R> {
    /// Create a new asset store.
    #[must_use]
    pub fn new(blob: Arc<B>, repo: Arc<R>) -> Self {
        Self { blob, repo }
    }

    /// Upload a new asset: write the blob, then persist the metadata row.
    ///
    /// The row is only created after the blob write succeeds, so a storage
    /// failure leaves nothing behind. If the row insert fails after the blob
    /// was written, the blob is removed again on a best-effort basis.
    ///
    /// For singular target kinds (profile, banner, ...) any previous asset on
    /// the same target is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if validation, the blob write, or the row insert
    /// fails.
    pub async fn upload(&self, input: UploadInput) -> Result<StoredAsset, AssetError> {
        self.blob
            .validate_upload(&input.content_type, input.bytes.len() as u64)?;

        let blob_key = generate_blob_key(input.target_kind.as_str(), &input.file_name);
        let file_size = i64::try_from(input.bytes.len()).unwrap_or(i64::MAX);

        self.blob
            .put(&blob_key, input.bytes, &input.content_type)
            .await?;

        let record = NewAssetRecord {
            target_kind: input.target_kind,
            target: input.target,
            blob_key: blob_key.clone(),
            owner_email: input.owner_email,
            file_name: input.file_name,
            content_type: input.content_type,
            file_size,
        };

        let asset = match self.repo.insert(record).await {
            Ok(asset) => asset,
            Err(e) => {
                if let Err(cleanup) = self.blob.delete(&blob_key).await {
                    warn!(key = %blob_key, error = %cleanup, "orphan blob left after failed insert");
                }
                return Err(e);
            }
        };

        if input.target_kind.is_singular() {
            self.replace_previous(&asset).await;
        }

        debug!(asset_id = %asset.id, key = %asset.blob_key, "asset uploaded");

        Ok(StoredAsset {
            public_url: self.blob.public_url(&asset.blob_key),
            asset,
        })
    }

    /// Delete an asset: blob first, metadata row only once the blob is gone.
    ///
    /// A missing blob counts as deleted (nothing left to leak). Any other
    /// storage failure retains the row, which keeps the asset detectable for
    /// a later retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob deletion fails (row retained) or the row
    /// removal fails.
    pub async fn delete(&self, asset: &Asset) -> Result<bool, AssetError> {
        match self.blob.delete(&asset.blob_key).await {
            Ok(()) => {}
            Err(StorageError::NotFound { .. }) => {
                debug!(asset_id = %asset.id, key = %asset.blob_key, "blob already gone");
            }
            Err(e) => return Err(e.into()),
        }
        self.repo.delete_row(asset.id).await
    }

    /// Bulk-move every asset on `(kind, from)` to `to`.
    ///
    /// Idempotent: a repeat run matches zero rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository update fails.
    pub async fn retarget(
        &self,
        kind: TargetKind,
        from: TargetRef,
        to: TargetRef,
    ) -> Result<u64, AssetError> {
        let moved = self.repo.retarget(kind, from, to).await?;
        debug!(kind = %kind, %from, %to, moved, "assets retargeted");
        Ok(moved)
    }

    /// List assets attached to one target.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository query fails.
    pub async fn list_by_target(
        &self,
        kind: TargetKind,
        target: TargetRef,
    ) -> Result<Vec<Asset>, AssetError> {
        self.repo.list_by_target(kind, target).await
    }

    /// List assets staged under a draft handle, across all target kinds.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository query fails.
    pub async fn list_staged(&self, handle: DraftHandle) -> Result<Vec<Asset>, AssetError> {
        self.repo.list_staged(handle).await
    }

    /// Get asset by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset does not exist or the query fails.
    pub async fn get_by_id(&self, id: AssetId) -> Result<Asset, AssetError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AssetError::not_found(id))
    }

    /// Full public URL for a blob key.
    #[must_use]
    pub fn public_url(&self, blob_key: &str) -> String {
        self.blob.public_url(blob_key)
    }

    /// Best-effort removal of older assets on a singular target.
    async fn replace_previous(&self, fresh: &Asset) {
        let previous = match self
            .repo
            .list_by_target(fresh.target_kind, fresh.target)
            .await
        {
            Ok(assets) => assets,
            Err(e) => {
                warn!(error = %e, "failed to list previous assets for replacement");
                return;
            }
        };

        for old in previous.into_iter().filter(|a| a.id != fresh.id) {
            if let Err(e) = self.delete(&old).await {
                warn!(asset_id = %old.id, error = %e, "failed to replace previous asset");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryBlobStore, MockAssetRepository, png_upload};
    use driftwood_shared::types::ResourceId;

    fn store() -> (
        AssetStore<MemoryBlobStore, MockAssetRepository>,
        Arc<MemoryBlobStore>,
        Arc<MockAssetRepository>,
    ) {
        let blob = Arc::new(MemoryBlobStore::new());
        let repo = Arc::new(MockAssetRepository::new());
        (AssetStore::new(blob.clone(), repo.clone()), blob, repo)
    }

    #[tokio::test]
    async fn test_upload_writes_blob_then_row() {
        let (store, blob, repo) = store();
        let handle = DraftHandle::from_raw(-5).unwrap();

        let stored = store
            .upload(png_upload(TargetKind::Community, TargetRef::Draft(handle)))
            .await
            .unwrap();

        assert!(blob.contains(&stored.asset.blob_key));
        assert_eq!(repo.count(), 1);
        assert_eq!(stored.asset.target, TargetRef::Draft(handle));
        assert!(
            stored
                .public_url
                .starts_with("https://cdn.test/media/community/")
        );
    }

    #[tokio::test]
    async fn test_upload_blob_failure_creates_no_row() {
        let (store, blob, repo) = store();
        blob.fail_next_put();

        let result = store
            .upload(png_upload(
                TargetKind::Community,
                TargetRef::Persisted(ResourceId::new(1)),
            ))
            .await;

        assert!(matches!(result, Err(AssetError::Storage(_))));
        assert_eq!(repo.count(), 0);
        assert_eq!(blob.blob_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_mime_type() {
        let (store, _, repo) = store();
        let mut input = png_upload(
            TargetKind::Community,
            TargetRef::Persisted(ResourceId::new(1)),
        );
        input.content_type = "application/pdf".to_string();

        let result = store.upload(input).await;
        assert!(matches!(
            result,
            Err(AssetError::Storage(StorageError::InvalidMimeType { .. }))
        ));
        assert_eq!(repo.count(), 0);
    }

    #[tokio::test]
    async fn test_upload_row_failure_cleans_blob() {
        let (store, blob, repo) = store();
        repo.fail_next_insert();

        let result = store
            .upload(png_upload(
                TargetKind::Community,
                TargetRef::Persisted(ResourceId::new(1)),
            ))
            .await;

        assert!(matches!(result, Err(AssetError::Repository(_))));
        assert_eq!(blob.blob_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_singular_kind_replaces_previous() {
        let (store, blob, repo) = store();
        let target = TargetRef::Persisted(ResourceId::new(9));

        let first = store
            .upload(png_upload(TargetKind::Profile, target))
            .await
            .unwrap();
        let second = store
            .upload(png_upload(TargetKind::Profile, target))
            .await
            .unwrap();

        assert_eq!(repo.count(), 1);
        assert!(!blob.contains(&first.asset.blob_key));
        assert!(blob.contains(&second.asset.blob_key));
    }

    #[tokio::test]
    async fn test_delete_removes_blob_then_row() {
        let (store, blob, repo) = store();
        let stored = store
            .upload(png_upload(
                TargetKind::Community,
                TargetRef::Persisted(ResourceId::new(1)),
            ))
            .await
            .unwrap();

        assert!(store.delete(&stored.asset).await.unwrap());
        assert!(!blob.contains(&stored.asset.blob_key));
        assert_eq!(repo.count(), 0);
    }

    #[tokio::test]
    async fn test_delete_blob_failure_retains_row() {
        let (store, blob, repo) = store();
        let stored = store
            .upload(png_upload(
                TargetKind::Community,
                TargetRef::Persisted(ResourceId::new(1)),
            ))
            .await
            .unwrap();
        blob.fail_deletes_for(&stored.asset.blob_key);

        let result = store.delete(&stored.asset).await;
        assert!(matches!(result, Err(AssetError::Storage(_))));
        // The row deliberately stays: a row with an un-deletable blob is
        // detectable, a blob with no row is not.
        assert_eq!(repo.count(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_blob_still_removes_row() {
        let (store, blob, repo) = store();
        let stored = store
            .upload(png_upload(
                TargetKind::Community,
                TargetRef::Persisted(ResourceId::new(1)),
            ))
            .await
            .unwrap();
        blob.remove_silently(&stored.asset.blob_key);

        assert!(store.delete(&stored.asset).await.unwrap());
        assert_eq!(repo.count(), 0);
    }

    #[tokio::test]
    async fn test_retarget_moves_only_matched_set() {
        let (store, _, repo) = store();
        let handle = DraftHandle::from_raw(-42).unwrap();

        let a = store
            .upload(png_upload(TargetKind::Community, TargetRef::Draft(handle)))
            .await
            .unwrap();
        let b = store
            .upload(png_upload(TargetKind::Community, TargetRef::Draft(handle)))
            .await
            .unwrap();
        // Different kind, same raw target: must stay put.
        let c = store
            .upload(png_upload(TargetKind::Notice, TargetRef::Draft(handle)))
            .await
            .unwrap();
        // Same kind, different target: must stay put.
        let d = store
            .upload(png_upload(
                TargetKind::Community,
                TargetRef::Persisted(ResourceId::new(7)),
            ))
            .await
            .unwrap();

        let moved = store
            .retarget(
                TargetKind::Community,
                TargetRef::Draft(handle),
                TargetRef::Persisted(ResourceId::new(55)),
            )
            .await
            .unwrap();

        assert_eq!(moved, 2);
        let persisted = TargetRef::Persisted(ResourceId::new(55));
        assert_eq!(repo.get(a.asset.id).unwrap().target, persisted);
        assert_eq!(repo.get(b.asset.id).unwrap().target, persisted);
        assert_eq!(repo.get(c.asset.id).unwrap().target, TargetRef::Draft(handle));
        assert_eq!(
            repo.get(d.asset.id).unwrap().target,
            TargetRef::Persisted(ResourceId::new(7))
        );

        // Idempotent: the matched set is now empty.
        let again = store
            .retarget(
                TargetKind::Community,
                TargetRef::Draft(handle),
                TargetRef::Persisted(ResourceId::new(55)),
            )
            .await
            .unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let (store, _, _) = store();
        let result = store.get_by_id(AssetId::new(404)).await;
        assert!(matches!(result, Err(AssetError::NotFound(_))));
    }
}
