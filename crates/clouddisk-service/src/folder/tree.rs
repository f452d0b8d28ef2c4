//! Path resolution over the flat node table.

use std::sync::Arc;

use tracing::{debug, info};

use clouddisk_core::error::{AppError, ErrorKind};
use clouddisk_core::result::AppResult;
use clouddisk_core::types::{NodeId, OwnerId};
use clouddisk_database::repositories::NodeRepository;
use clouddisk_entity::node::{CreateNode, Node};

use crate::path::{normalize_path, validate_entry_name};

/// Resolves slash-separated paths to directory nodes, creating missing
/// segments on demand.
#[derive(Debug, Clone)]
pub struct TreeResolver {
    /// Node repository.
    repo: Arc<dyn NodeRepository>,
}

impl TreeResolver {
    /// Creates a new tree resolver.
    pub fn new(repo: Arc<dyn NodeRepository>) -> Self {
        Self { repo }
    }

    /// Resolve `path` from the virtual root, creating every missing
    /// directory. Returns the id of the final directory (0 for an empty path).
    pub async fn resolve_or_create(&self, owner: OwnerId, path: &str) -> AppResult<NodeId> {
        self.resolve_or_create_from(owner, NodeId::ROOT, path).await
    }

    /// Resolve `path` starting at directory `start`, creating every missing
    /// directory.
    pub async fn resolve_or_create_from(
        &self,
        owner: OwnerId,
        start: NodeId,
        path: &str,
    ) -> AppResult<NodeId> {
        let segments = normalize_path(path)?;
        let mut current = self.directory(owner, start).await?;
        for seg in &segments {
            current = self.ensure_child_dir(owner, &current, seg).await?;
        }
        Ok(current.id)
    }

    /// Resolve `path` from the virtual root without creating anything.
    ///
    /// The empty path yields the synthetic root node. The first missing
    /// segment fails with `NotFound`.
    pub async fn resolve_existing(&self, owner: OwnerId, path: &str) -> AppResult<Node> {
        let segments = normalize_path(path)?;
        let mut current = Node::root(owner);
        for (depth, seg) in segments.iter().enumerate() {
            current = self
                .repo
                .find_dir_by_parent_and_name(owner, current.id, seg)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!(
                        "Folder '/{}' not found",
                        segments[..=depth].join("/")
                    ))
                })?;
        }
        Ok(current)
    }

    /// Load the directory `id`, or the synthetic root for id 0.
    ///
    /// Files and foreign nodes are reported as `NotFound`.
    pub async fn directory(&self, owner: OwnerId, id: NodeId) -> AppResult<Node> {
        if id.is_root() {
            return Ok(Node::root(owner));
        }
        let node = self.repo.find_by_id(id, owner).await?;
        if !node.is_dir {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        }
        Ok(node)
    }

    /// Find the directory `name` under `parent`, creating it if absent.
    ///
    /// A concurrent creator may win the insert; the loser re-reads once and
    /// continues with the winner's row. A second miss is a real conflict.
    pub async fn ensure_child_dir(&self, owner: OwnerId, parent: &Node, name: &str) -> AppResult<Node> {
        validate_entry_name(name)?;

        if let Some(existing) = self
            .repo
            .find_dir_by_parent_and_name(owner, parent.id, name)
            .await?
        {
            return Ok(existing);
        }

        let data = CreateNode::directory(owner, parent.id, name, parent.child_path(name));
        match self.repo.create(&data).await {
            Ok(created) => {
                info!(
                    owner_id = %owner,
                    folder_id = %created.id,
                    path = %created.path,
                    "Created folder"
                );
                Ok(created)
            }
            Err(e) if e.is(ErrorKind::Conflict) => {
                debug!(owner_id = %owner, path = %data.path, "Folder created concurrently, re-reading");
                self.repo
                    .find_dir_by_parent_and_name(owner, parent.id, name)
                    .await?
                    .ok_or_else(|| {
                        AppError::conflict(format!("Folder '{}' could not be created", data.path))
                    })
            }
            Err(e) => Err(e),
        }
    }
}
