//! File service: upload, download, listing, and delete across both stores.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use clouddisk_core::error::{AppError, ErrorKind};
use clouddisk_core::result::AppResult;
use clouddisk_core::traits::blob::{BlobStore, ByteStream};
use clouddisk_core::types::{NodeId, OwnerId, PageRequest};
use clouddisk_database::repositories::NodeRepository;
use clouddisk_entity::node::{CreateNode, Node, NodeListing};

use super::digest::{content_digest, storage_key};
use crate::folder::TreeResolver;
use crate::path::{base_name, split_relative_path, validate_entry_name};

/// A single-file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// File content.
    pub data: Bytes,
    /// Client-supplied name; only its final component is kept.
    pub original_name: String,
    /// MIME type; guessed from the name when absent.
    pub mime_type: Option<String>,
    /// Target directory (0 for the root).
    pub parent_id: NodeId,
}

/// One entry of a batch upload.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// File content.
    pub data: Bytes,
    /// Path relative to the batch's parent, e.g. `docs/2024/report.pdf`.
    pub relative_path: String,
    /// Name used when `relative_path` has no usable base name.
    pub fallback_name: String,
    /// MIME type; guessed from the name when absent.
    pub mime_type: Option<String>,
}

/// Which directory to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListTarget {
    /// A directory id (0 for the root).
    Parent(NodeId),
    /// A slash-separated path from the root.
    Path(String),
}

/// A file's metadata together with its content stream.
pub struct Download {
    /// The file node.
    pub node: Node,
    /// Content stream from the blob store.
    pub stream: ByteStream,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

/// Orchestrates the node repository and the blob store.
///
/// Uploads write the blob before the row and remove the blob again if the
/// row cannot be written. Deletes always remove the row, even when the blob
/// cannot be removed.
#[derive(Debug, Clone)]
pub struct FileService {
    /// Node repository.
    repo: Arc<dyn NodeRepository>,
    /// Blob store holding file content.
    blobs: Arc<dyn BlobStore>,
    /// Path resolver over the same repository.
    tree: TreeResolver,
    /// Upper bound on a single file's size.
    max_upload_size_bytes: u64,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        repo: Arc<dyn NodeRepository>,
        blobs: Arc<dyn BlobStore>,
        max_upload_size_bytes: u64,
    ) -> Self {
        Self {
            tree: TreeResolver::new(repo.clone()),
            repo,
            blobs,
            max_upload_size_bytes,
        }
    }

    /// The tree resolver sharing this service's repository.
    pub fn tree(&self) -> &TreeResolver {
        &self.tree
    }

    /// Store a file under `request.parent_id`.
    pub async fn upload(&self, owner: OwnerId, request: UploadRequest) -> AppResult<Node> {
        let name = base_name(&request.original_name);
        validate_entry_name(name)?;

        let size = request.data.len() as u64;
        if size > self.max_upload_size_bytes {
            return Err(AppError::invalid_input(format!(
                "File exceeds maximum upload size of {} bytes",
                self.max_upload_size_bytes
            )));
        }

        let parent = self.tree.directory(owner, request.parent_id).await?;

        let digest = content_digest(&request.data);
        let key = storage_key(owner, &digest, name);
        let mime_type = request.mime_type.or_else(|| guess_mime(name));

        self.blobs.put(&key, request.data, size).await?;

        let data = CreateNode {
            owner_id: owner,
            parent_id: parent.id,
            name: name.to_string(),
            path: parent.child_path(name),
            is_dir: false,
            size_bytes: size as i64,
            mime_type,
            content_hash: Some(digest),
            storage_key: Some(key.clone()),
            is_public: false,
        };

        match self.repo.create(&data).await {
            Ok(node) => {
                info!(
                    owner_id = %owner,
                    file_id = %node.id,
                    path = %node.path,
                    size = node.size_bytes,
                    storage_key = %key,
                    "Upload completed"
                );
                Ok(node)
            }
            Err(e) => {
                warn!(owner_id = %owner, storage_key = %key, error = %e, "Metadata write failed after blob upload");
                self.release_blob(owner, &key, 0).await;
                Err(e)
            }
        }
    }

    /// Upload several files, creating the directories named by each item's
    /// relative path. Stops at the first failure; earlier files stay stored.
    pub async fn batch_upload(
        &self,
        owner: OwnerId,
        items: Vec<BatchItem>,
        parent_id: NodeId,
    ) -> AppResult<Vec<Node>> {
        let mut uploaded = Vec::with_capacity(items.len());
        for item in items {
            let (dir_part, base) = split_relative_path(&item.relative_path);
            let name = match base {
                "" | "." | ".." => base_name(&item.fallback_name),
                name => name,
            }
            .to_string();

            let folder_id = self
                .tree
                .resolve_or_create_from(owner, parent_id, dir_part)
                .await?;

            let node = self
                .upload(
                    owner,
                    UploadRequest {
                        data: item.data,
                        original_name: name,
                        mime_type: item.mime_type,
                        parent_id: folder_id,
                    },
                )
                .await?;
            uploaded.push(node);
        }

        info!(owner_id = %owner, count = uploaded.len(), "Batch upload completed");
        Ok(uploaded)
    }

    /// Open a file's content.
    pub async fn download(&self, owner: OwnerId, node_id: NodeId) -> AppResult<Download> {
        let node = self.repo.find_by_id(node_id, owner).await?;
        let key = match (&node.storage_key, node.is_dir) {
            (Some(key), false) => key.clone(),
            _ => {
                return Err(AppError::invalid_input(format!(
                    "Node {node_id} is a directory"
                )));
            }
        };
        let stream = self.blobs.get(&key).await?;
        Ok(Download { node, stream })
    }

    /// Fetch a node's metadata.
    pub async fn get_node(&self, owner: OwnerId, node_id: NodeId) -> AppResult<Node> {
        self.repo.find_by_id(node_id, owner).await
    }

    /// Delete a file or an empty directory.
    ///
    /// A directory that still has children is a `Conflict`, so no node is
    /// ever left pointing at a missing parent.
    pub async fn delete(&self, owner: OwnerId, node_id: NodeId) -> AppResult<()> {
        let node = self.repo.find_by_id(node_id, owner).await?;

        if node.is_dir {
            let (_, children) = self.repo.list_children(owner, node_id, 0, 1).await?;
            if children > 0 {
                return Err(AppError::conflict(format!(
                    "Folder '{}' is not empty ({children} entries)",
                    node.path
                )));
            }
        } else if let Some(key) = &node.storage_key {
            self.release_blob(owner, key, 1).await;
        }

        self.repo.delete(node_id, owner).await?;
        info!(owner_id = %owner, node_id = %node_id, path = %node.path, "Deleted node");
        Ok(())
    }

    /// List one page of a directory's children, directories first.
    pub async fn list(
        &self,
        owner: OwnerId,
        target: ListTarget,
        page: PageRequest,
    ) -> AppResult<NodeListing> {
        let parent_id = match target {
            ListTarget::Parent(id) => id,
            ListTarget::Path(path) => match self.tree.resolve_existing(owner, &path).await {
                Ok(dir) => dir.id,
                Err(e) if e.is(ErrorKind::NotFound) => {
                    return Ok(NodeListing::empty(&page));
                }
                Err(e) => return Err(e),
            },
        };

        let (items, total) = self
            .repo
            .list_children(owner, parent_id, page.offset(), page.limit())
            .await?;
        Ok(NodeListing::new(items, &page, total))
    }

    /// Find or create the folder `name`.
    ///
    /// The folder is placed under `parent_id`, or under `under_path`
    /// resolved (and created) relative to `parent_id` when given.
    pub async fn create_folder(
        &self,
        owner: OwnerId,
        name: &str,
        parent_id: NodeId,
        under_path: Option<&str>,
    ) -> AppResult<Node> {
        validate_entry_name(name)?;

        let parent_id = match under_path {
            Some(path) => self.tree.resolve_or_create_from(owner, parent_id, path).await?,
            None => parent_id,
        };
        let parent = self.tree.directory(owner, parent_id).await?;
        self.tree.ensure_child_dir(owner, &parent, name).await
    }

    /// Remove the blob under `key` unless more than `own_refs` files still
    /// reference it. Failures are logged and swallowed.
    async fn release_blob(&self, owner: OwnerId, key: &str, own_refs: u64) {
        match self.repo.count_by_storage_key(owner, key).await {
            Ok(refs) if refs > own_refs => {
                debug!(storage_key = %key, refs, "Blob still referenced, keeping it");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(storage_key = %key, error = %e, "Could not count blob references, keeping blob");
                return;
            }
        }

        if let Err(e) = self.blobs.delete(key).await {
            warn!(storage_key = %key, error = %e, "Best-effort blob delete failed");
        }
    }
}

fn guess_mime(name: &str) -> Option<String> {
    mime_guess::from_path(name).first_raw().map(str::to_string)
}
