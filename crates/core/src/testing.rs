//! Test doubles shared across the crate's unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use bytes::Bytes;
use chrono::Utc;
use driftwood_shared::types::{AssetId, DraftHandle, TargetRef, UserId};

use crate::asset::{Asset, AssetError, AssetRepository, NewAssetRecord, TargetKind, UploadInput};
use crate::publish::{NewPost, Post, PostRepository, PublishError};
use crate::storage::{BlobStore, StorageError};

const TEST_BASE_URL: &str = "https://cdn.test/media";
const TEST_MAX_SIZE: u64 = 1024 * 1024;

/// In-memory blob store with injectable failures.
#[derive(Debug, Default)]
pub(crate) struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
    fail_next_put: AtomicBool,
    failing_deletes: Mutex<HashSet<String>>,
}

impl MemoryBlobStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_next_put(&self) {
        self.fail_next_put.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_deletes_for(&self, key: &str) {
        self.failing_deletes.lock().unwrap().insert(key.to_string());
    }

    pub(crate) fn allow_deletes_for(&self, key: &str) {
        self.failing_deletes.lock().unwrap().remove(key);
    }

    pub(crate) fn remove_silently(&self, key: &str) {
        self.blobs.lock().unwrap().remove(key);
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    pub(crate) fn blob_count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, _bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        if self.fail_next_put.swap(false, Ordering::SeqCst) {
            return Err(StorageError::operation("injected put failure"));
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), content_type.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.failing_deletes.lock().unwrap().contains(key) {
            return Err(StorageError::operation("injected delete failure"));
        }
        if self.blobs.lock().unwrap().remove(key).is_none() {
            return Err(StorageError::not_found(key));
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> bool {
        self.contains(key)
    }

    fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > TEST_MAX_SIZE {
            return Err(StorageError::file_too_large(size, TEST_MAX_SIZE));
        }
        let allowed = ["image/png", "image/jpeg", "image/gif", "image/webp"];
        if !allowed.contains(&content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{TEST_BASE_URL}/{key}")
    }
}

/// In-memory asset repository. Ids start at 101 to mirror realistic rows.
#[derive(Debug)]
pub(crate) struct MockAssetRepository {
    assets: Mutex<HashMap<i64, Asset>>,
    next_id: AtomicI64,
    fail_next_insert: AtomicBool,
}

impl MockAssetRepository {
    pub(crate) fn new() -> Self {
        Self {
            assets: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(101),
            fail_next_insert: AtomicBool::new(false),
        }
    }

    pub(crate) fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    pub(crate) fn count(&self) -> usize {
        self.assets.lock().unwrap().len()
    }

    pub(crate) fn get(&self, id: AssetId) -> Option<Asset> {
        self.assets.lock().unwrap().get(&id.into_inner()).cloned()
    }
}

impl AssetRepository for MockAssetRepository {
    async fn insert(&self, record: NewAssetRecord) -> Result<Asset, AssetError> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(AssetError::repository("injected insert failure"));
        }
        let id = AssetId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let asset = Asset {
            id,
            target_kind: record.target_kind,
            target: record.target,
            blob_key: record.blob_key,
            owner_email: record.owner_email,
            file_name: record.file_name,
            content_type: record.content_type,
            file_size: record.file_size,
            created_at: Utc::now(),
        };
        self.assets
            .lock()
            .unwrap()
            .insert(id.into_inner(), asset.clone());
        Ok(asset)
    }

    async fn find_by_id(&self, id: AssetId) -> Result<Option<Asset>, AssetError> {
        Ok(self.get(id))
    }

    async fn list_by_target(
        &self,
        kind: TargetKind,
        target: TargetRef,
    ) -> Result<Vec<Asset>, AssetError> {
        Ok(self
            .assets
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.target_kind == kind && a.target == target)
            .cloned()
            .collect())
    }

    async fn list_staged(&self, handle: DraftHandle) -> Result<Vec<Asset>, AssetError> {
        Ok(self
            .assets
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.target == TargetRef::Draft(handle))
            .cloned()
            .collect())
    }

    async fn retarget(
        &self,
        kind: TargetKind,
        from: TargetRef,
        to: TargetRef,
    ) -> Result<u64, AssetError> {
        let mut assets = self.assets.lock().unwrap();
        let mut moved = 0;
        for asset in assets.values_mut() {
            if asset.target_kind == kind && asset.target == from {
                asset.target = to;
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn delete_row(&self, id: AssetId) -> Result<bool, AssetError> {
        Ok(self.assets.lock().unwrap().remove(&id.into_inner()).is_some())
    }
}

/// In-memory post repository. Ids start at 55; the claim step retargets
/// through the shared asset repository, mimicking the single transaction.
#[derive(Debug)]
pub(crate) struct MockPostRepository {
    posts: Mutex<HashMap<i64, Post>>,
    next_id: AtomicI64,
    fail_next_create: AtomicBool,
    asset_repo: std::sync::Arc<MockAssetRepository>,
}

impl MockPostRepository {
    pub(crate) fn new(asset_repo: std::sync::Arc<MockAssetRepository>) -> Self {
        Self {
            posts: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(55),
            fail_next_create: AtomicBool::new(false),
            asset_repo,
        }
    }

    pub(crate) fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    pub(crate) fn count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

impl PostRepository for MockPostRepository {
    async fn create_with_claim(
        &self,
        post: NewPost,
        handle: DraftHandle,
    ) -> Result<Post, PublishError> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(PublishError::repository("injected create failure"));
        }
        let id = driftwood_shared::types::ResourceId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        let post = Post {
            id,
            kind: post.kind,
            author_id: post.author_id,
            title: post.title,
            content: post.content,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().unwrap().insert(id.into_inner(), post.clone());

        self.asset_repo
            .retarget(
                post.kind.target_kind(),
                TargetRef::Draft(handle),
                TargetRef::Persisted(id),
            )
            .await
            .map_err(|e| PublishError::repository(e.to_string()))?;

        Ok(post)
    }

    async fn find_by_id(
        &self,
        id: driftwood_shared::types::ResourceId,
    ) -> Result<Option<Post>, PublishError> {
        Ok(self.posts.lock().unwrap().get(&id.into_inner()).cloned())
    }

    async fn update_content(
        &self,
        id: driftwood_shared::types::ResourceId,
        content: String,
    ) -> Result<Option<Post>, PublishError> {
        let mut posts = self.posts.lock().unwrap();
        Ok(posts.get_mut(&id.into_inner()).map(|post| {
            post.content = content;
            post.updated_at = Utc::now();
            post.clone()
        }))
    }

    async fn delete(
        &self,
        id: driftwood_shared::types::ResourceId,
    ) -> Result<bool, PublishError> {
        Ok(self.posts.lock().unwrap().remove(&id.into_inner()).is_some())
    }
}

/// A small valid PNG upload targeting the given resource reference.
pub(crate) fn png_upload(target_kind: TargetKind, target: TargetRef) -> UploadInput {
    UploadInput {
        target_kind,
        target,
        owner_email: "traveler@example.com".to_string(),
        file_name: "photo.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\nfakedata"),
    }
}

/// Convenience user used across tests.
pub(crate) fn test_user() -> UserId {
    UserId::new(10)
}
