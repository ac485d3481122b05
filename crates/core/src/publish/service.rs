//! Finalization orchestrator.

use std::sync::Arc;

use driftwood_shared::types::{DraftHandle, ResourceId, TargetRef, UserId};
use tracing::{info, warn};

use super::error::PublishError;
use super::scheduler::{CommittedResource, ReconcileScheduler};
use super::types::{NewPost, Post};
use crate::asset::{AssetRepository, AssetStore, ReclaimQueue};
use crate::draft::DraftRegistry;
use crate::storage::BlobStore;

/// Repository trait for post persistence.
///
/// Implemented by the db crate. `create_with_claim` is the transactional
/// seam: inserting the post row and retargeting its staged assets must both
/// commit or neither does.
pub trait PostRepository: Send + Sync {
    /// Insert the post row and, in the same transaction, bulk-retarget every
    /// asset staged under `handle` onto the new post id.
    fn create_with_claim(
        &self,
        post: NewPost,
        handle: DraftHandle,
    ) -> impl std::future::Future<Output = Result<Post, PublishError>> + Send;

    /// Find post by ID.
    fn find_by_id(
        &self,
        id: ResourceId,
    ) -> impl std::future::Future<Output = Result<Option<Post>, PublishError>> + Send;

    /// Persist new content; returns the updated post, or `None` if absent.
    fn update_content(
        &self,
        id: ResourceId,
        content: String,
    ) -> impl std::future::Future<Output = Result<Option<Post>, PublishError>> + Send;

    /// Delete the post row; returns whether a row was removed.
    fn delete(
        &self,
        id: ResourceId,
    ) -> impl std::future::Future<Output = Result<bool, PublishError>> + Send;
}

/// Orchestrates the draft-to-real lifecycle of rich-text posts.
pub struct Publisher<B, R, P, D>
where
    B: BlobStore,
    R: AssetRepository,
    P: PostRepository,
    D: DraftRegistry,
{
    posts: Arc<P>,
    assets: Arc<AssetStore<B, R>>,
    registry: Arc<D>,
    scheduler: Arc<dyn ReconcileScheduler>,
    reclaim: Arc<ReclaimQueue>,
}

impl<B, R, P, D> Publisher<B, R, P, D>
where
    B: BlobStore,
    R: AssetRepository,
    P: PostRepository,
    D: DraftRegistry,
{
    /// Create a new publisher.
    #[must_use]
    pub fn new(
        posts: Arc<P>,
        assets: Arc<AssetStore<B, R>>,
        registry: Arc<D>,
        scheduler: Arc<dyn ReconcileScheduler>,
        reclaim: Arc<ReclaimQueue>,
    ) -> Self {
        Self {
            posts,
            assets,
            registry,
            scheduler,
            reclaim,
        }
    }

    /// Finalize a draft into a persisted post.
    ///
    /// The handle is consumed atomically, so of two concurrent finalize calls
    /// exactly one creates a post; the other observes a not-found handle.
    /// Post row and asset claim commit in one transaction; reconciliation of
    /// unreferenced uploads is scheduled strictly after that commit.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or foreign handle, empty title, or a
    /// failed persistence step. On persistence failure the handle is handed
    /// back so the client may retry.
    pub async fn finalize(
        &self,
        handle: DraftHandle,
        caller: UserId,
        fields: NewPost,
    ) -> Result<Post, PublishError> {
        if fields.title.trim().is_empty() {
            return Err(PublishError::validation("title must not be empty"));
        }

        let owner = self.registry.consume(handle, caller)?;

        let post = match self.posts.create_with_claim(fields, handle).await {
            Ok(post) => post,
            Err(e) => {
                // Hand the handle back so the draft stays finalizable.
                self.registry.register(handle, owner);
                return Err(e);
            }
        };

        info!(
            post_id = %post.id,
            kind = %post.kind,
            author_id = %post.author_id,
            %handle,
            "draft finalized"
        );

        self.scheduler.schedule(CommittedResource::from(&post));
        Ok(post)
    }

    /// Persist new content for an existing post and schedule reconciliation;
    /// attachments may have been added or removed across the edit.
    ///
    /// # Errors
    ///
    /// Returns `PostNotFound` for an unknown id or a repository error.
    pub async fn update_content(
        &self,
        id: ResourceId,
        new_content: String,
    ) -> Result<Post, PublishError> {
        let post = self
            .posts
            .update_content(id, new_content)
            .await?
            .ok_or(PublishError::PostNotFound(id))?;

        info!(post_id = %post.id, "post content updated");

        self.scheduler.schedule(CommittedResource::from(&post));
        Ok(post)
    }

    /// Delete a post and cascade-delete its assets.
    ///
    /// Every asset gets an independent delete attempt; a failed blob delete
    /// retains that one row (queued for retry) and never blocks the post row
    /// deletion. Returns the number of asset rows removed.
    ///
    /// # Errors
    ///
    /// Returns `PostNotFound` for an unknown id or a repository error.
    pub async fn delete(&self, id: ResourceId) -> Result<u64, PublishError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(PublishError::PostNotFound(id))?;

        let kind = post.kind.target_kind();
        let attached = self
            .assets
            .list_by_target(kind, TargetRef::Persisted(id))
            .await?;

        let mut removed = 0u64;
        for asset in attached {
            match self.assets.delete(&asset).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(asset_id = %asset.id, error = %e, "cascade delete failed, queued for retry");
                    self.reclaim.push(asset);
                }
            }
        }

        self.posts.delete(id).await?;
        info!(post_id = %id, removed_assets = removed, "post deleted");
        Ok(removed)
    }

    /// Fetch a post.
    ///
    /// # Errors
    ///
    /// Returns `PostNotFound` for an unknown id or a repository error.
    pub async fn get(&self, id: ResourceId) -> Result<Post, PublishError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(PublishError::PostNotFound(id))
    }
}
