//! In-memory node repository: an arena of nodes indexed by id.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use clouddisk_core::error::AppError;
use clouddisk_core::result::AppResult;
use clouddisk_core::types::{NodeId, OwnerId};
use clouddisk_entity::node::{CreateNode, Node};

use super::NodeRepository;

/// Key of the directory-sibling uniqueness index.
type SiblingKey = (OwnerId, NodeId, String);

#[derive(Debug)]
struct Arena {
    /// All rows, keyed by id.
    nodes: HashMap<NodeId, Node>,
    /// Directory rows keyed by (owner, parent, name).
    dirs: HashMap<SiblingKey, NodeId>,
    /// Next id to hand out; ids start at 1 so that 0 stays the root.
    next_id: i64,
}

/// Node repository that keeps the whole tree in process memory.
///
/// Suitable for tests and single-process tools. Cloning shares the arena.
#[derive(Debug, Clone)]
pub struct MemoryNodeRepository {
    arena: Arc<RwLock<Arena>>,
}

impl MemoryNodeRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            arena: Arc::new(RwLock::new(Arena {
                nodes: HashMap::new(),
                dirs: HashMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Number of stored rows across all owners.
    pub async fn len(&self) -> usize {
        self.arena.read().await.nodes.len()
    }

    /// Whether the arena holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryNodeRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeRepository for MemoryNodeRepository {
    async fn create(&self, data: &CreateNode) -> AppResult<Node> {
        let mut arena = self.arena.write().await;

        let key = (data.owner_id, data.parent_id, data.name.clone());
        if data.is_dir && arena.dirs.contains_key(&key) {
            return Err(AppError::conflict(format!(
                "Folder '{}' already exists",
                data.path
            )));
        }

        let id = NodeId(arena.next_id);
        arena.next_id += 1;

        let node = data.clone().into_node(id, Utc::now());
        if node.is_dir {
            arena.dirs.insert(key, id);
        }
        arena.nodes.insert(id, node.clone());
        Ok(node)
    }

    async fn find_by_id(&self, id: NodeId, owner: OwnerId) -> AppResult<Node> {
        let arena = self.arena.read().await;
        arena
            .nodes
            .get(&id)
            .filter(|n| n.owner_id == owner)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Node {id} not found")))
    }

    async fn find_dir_by_parent_and_name(
        &self,
        owner: OwnerId,
        parent_id: NodeId,
        name: &str,
    ) -> AppResult<Option<Node>> {
        let arena = self.arena.read().await;
        let found = arena
            .dirs
            .get(&(owner, parent_id, name.to_string()))
            .and_then(|id| arena.nodes.get(id))
            .cloned();
        Ok(found)
    }

    async fn list_children(
        &self,
        owner: OwnerId,
        parent_id: NodeId,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Node>, u64)> {
        let arena = self.arena.read().await;
        let mut children: Vec<&Node> = arena
            .nodes
            .values()
            .filter(|n| n.owner_id == owner && n.parent_id == parent_id)
            .collect();
        children.sort_by(|a, b| {
            (Reverse(a.is_dir), &a.name, a.id).cmp(&(Reverse(b.is_dir), &b.name, b.id))
        });

        let total = children.len() as u64;
        let page = children
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn delete(&self, id: NodeId, owner: OwnerId) -> AppResult<()> {
        let mut arena = self.arena.write().await;
        let owned = arena.nodes.get(&id).is_some_and(|n| n.owner_id == owner);
        if !owned {
            return Ok(());
        }
        if let Some(node) = arena.nodes.remove(&id) {
            if node.is_dir {
                arena.dirs.remove(&(node.owner_id, node.parent_id, node.name));
            }
        }
        Ok(())
    }

    async fn find_by_content_hash(&self, owner: OwnerId, hash: &str) -> AppResult<Option<Node>> {
        let arena = self.arena.read().await;
        let found = arena
            .nodes
            .values()
            .filter(|n| {
                n.owner_id == owner && !n.is_dir && n.content_hash.as_deref() == Some(hash)
            })
            .min_by_key(|n| n.id)
            .cloned();
        Ok(found)
    }

    async fn count_by_storage_key(&self, owner: OwnerId, storage_key: &str) -> AppResult<u64> {
        let arena = self.arena.read().await;
        let count = arena
            .nodes
            .values()
            .filter(|n| {
                n.owner_id == owner && !n.is_dir && n.storage_key.as_deref() == Some(storage_key)
            })
            .count();
        Ok(count as u64)
    }
}
