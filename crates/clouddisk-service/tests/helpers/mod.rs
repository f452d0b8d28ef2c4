//! Shared test helpers for service integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempDir;

use clouddisk_core::error::AppError;
use clouddisk_core::result::AppResult;
use clouddisk_core::traits::blob::{BlobStore, ByteStream};
use clouddisk_core::types::{NodeId, OwnerId};
use clouddisk_database::migration::run_migrations;
use clouddisk_database::repositories::{MemoryNodeRepository, NodeRepository, SqlNodeRepository};
use clouddisk_database::DatabasePool;
use clouddisk_entity::node::{CreateNode, Node};
use clouddisk_service::{FileService, UploadRequest};
use clouddisk_storage::LocalBlobStore;

/// Blob store wrapper whose `put` and `delete` can be made to fail.
#[derive(Debug)]
pub struct FaultyBlobStore {
    inner: LocalBlobStore,
    pub fail_put: AtomicBool,
    pub fail_delete: AtomicBool,
    pub delete_calls: AtomicUsize,
}

impl FaultyBlobStore {
    pub fn new(inner: LocalBlobStore) -> Self {
        Self {
            inner,
            fail_put: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn deletes(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    fn backend(&self) -> &str {
        "faulty"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn put(&self, key: &str, data: Bytes, size: u64) -> AppResult<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(AppError::storage("injected put failure"));
        }
        self.inner.put(key, data, size).await
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::storage("injected delete failure"));
        }
        self.inner.delete(key).await
    }

    async fn stat(&self, key: &str) -> AppResult<u64> {
        self.inner.stat(key).await
    }
}

/// Repository wrapper whose `create` of files can be made to fail and
/// whose directory lookups can be made to miss.
#[derive(Debug)]
pub struct FaultyRepo {
    inner: Arc<dyn NodeRepository>,
    pub fail_file_create: AtomicBool,
    /// Remaining directory lookups that report `None` regardless of the
    /// stored rows, as a caller that lost a creation race would observe.
    pub dir_lookup_misses: AtomicUsize,
}

impl FaultyRepo {
    pub fn new(inner: Arc<dyn NodeRepository>) -> Self {
        Self {
            inner,
            fail_file_create: AtomicBool::new(false),
            dir_lookup_misses: AtomicUsize::new(0),
        }
    }

    /// Make the next `count` directory lookups miss.
    pub fn miss_dir_lookups(&self, count: usize) {
        self.dir_lookup_misses.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl NodeRepository for FaultyRepo {
    async fn create(&self, data: &CreateNode) -> AppResult<Node> {
        if !data.is_dir && self.fail_file_create.load(Ordering::SeqCst) {
            return Err(AppError::database("injected create failure"));
        }
        self.inner.create(data).await
    }

    async fn find_by_id(&self, id: NodeId, owner: OwnerId) -> AppResult<Node> {
        self.inner.find_by_id(id, owner).await
    }

    async fn find_dir_by_parent_and_name(
        &self,
        owner: OwnerId,
        parent_id: NodeId,
        name: &str,
    ) -> AppResult<Option<Node>> {
        let missed = self
            .dir_lookup_misses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if missed {
            return Ok(None);
        }
        self.inner
            .find_dir_by_parent_and_name(owner, parent_id, name)
            .await
    }

    async fn list_children(
        &self,
        owner: OwnerId,
        parent_id: NodeId,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Node>, u64)> {
        self.inner.list_children(owner, parent_id, offset, limit).await
    }

    async fn delete(&self, id: NodeId, owner: OwnerId) -> AppResult<()> {
        self.inner.delete(id, owner).await
    }

    async fn find_by_content_hash(&self, owner: OwnerId, hash: &str) -> AppResult<Option<Node>> {
        self.inner.find_by_content_hash(owner, hash).await
    }

    async fn count_by_storage_key(&self, owner: OwnerId, storage_key: &str) -> AppResult<u64> {
        self.inner.count_by_storage_key(owner, storage_key).await
    }
}

/// A file service over fault-injecting stores.
pub struct TestApp {
    pub service: FileService,
    pub repo: Arc<FaultyRepo>,
    pub blobs: Arc<FaultyBlobStore>,
    /// Root of the local blob store; removed on drop.
    pub blob_dir: TempDir,
}

impl TestApp {
    /// Service backed by the in-memory arena.
    pub async fn memory() -> Self {
        Self::with_repo(Arc::new(MemoryNodeRepository::new())).await
    }

    /// Service backed by a private in-memory SQLite database.
    pub async fn sqlite() -> Self {
        let db = DatabasePool::in_memory().await.expect("open database");
        run_migrations(db.pool()).await.expect("run migrations");
        Self::with_repo(Arc::new(SqlNodeRepository::new(db.into_pool()))).await
    }

    async fn with_repo(inner: Arc<dyn NodeRepository>) -> Self {
        let blob_dir = tempfile::tempdir().expect("tempdir");
        let local = LocalBlobStore::new(blob_dir.path()).await.expect("blob store");
        let blobs = Arc::new(FaultyBlobStore::new(local));
        let repo = Arc::new(FaultyRepo::new(inner));
        let service = FileService::new(repo.clone(), blobs.clone(), 1024 * 1024);
        Self {
            service,
            repo,
            blobs,
            blob_dir,
        }
    }

    /// Upload `data` as `name` under `parent`.
    pub async fn upload(&self, owner: OwnerId, parent: NodeId, name: &str, data: &'static [u8]) -> AppResult<Node> {
        self.service
            .upload(
                owner,
                UploadRequest {
                    data: Bytes::from_static(data),
                    original_name: name.to_string(),
                    mime_type: None,
                    parent_id: parent,
                },
            )
            .await
    }

    /// Whether the blob under `key` exists on disk.
    pub async fn blob_exists(&self, key: &str) -> bool {
        self.blobs.stat(key).await.is_ok()
    }
}
