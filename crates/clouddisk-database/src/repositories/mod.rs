//! Metadata repositories for the node tree.
//!
//! [`NodeRepository`] is the seam the service layer depends on. Two
//! implementations exist: [`SqlNodeRepository`] on SQLite and
//! [`MemoryNodeRepository`], an in-process arena indexed by id.

pub mod memory;
pub mod node;

use async_trait::async_trait;

use clouddisk_core::result::AppResult;
use clouddisk_core::types::{NodeId, OwnerId};
use clouddisk_entity::node::{CreateNode, Node};

pub use memory::MemoryNodeRepository;
pub use node::SqlNodeRepository;

/// Persistence of the flat node table. Every operation is scoped to one
/// owner; rows of other owners are indistinguishable from missing rows.
#[async_trait]
pub trait NodeRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a node and return the stored row.
    ///
    /// Fails with `Conflict` when a directory with the same name already
    /// exists under the same parent for the same owner.
    async fn create(&self, data: &CreateNode) -> AppResult<Node>;

    /// Find a node by id. Fails with `NotFound` if absent or foreign.
    async fn find_by_id(&self, id: NodeId, owner: OwnerId) -> AppResult<Node>;

    /// Find a directory child of `parent_id` named `name`.
    async fn find_dir_by_parent_and_name(
        &self,
        owner: OwnerId,
        parent_id: NodeId,
        name: &str,
    ) -> AppResult<Option<Node>>;

    /// List a window of the children of `parent_id`, directories first and
    /// then by name, together with the total number of children.
    async fn list_children(
        &self,
        owner: OwnerId,
        parent_id: NodeId,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Node>, u64)>;

    /// Delete the row matching `id` and `owner`. Missing rows are not an error.
    async fn delete(&self, id: NodeId, owner: OwnerId) -> AppResult<()>;

    /// Find the first file whose content digest equals `hash`.
    async fn find_by_content_hash(&self, owner: OwnerId, hash: &str) -> AppResult<Option<Node>>;

    /// Count the files whose blob lives under `storage_key`.
    async fn count_by_storage_key(&self, owner: OwnerId, storage_key: &str) -> AppResult<u64>;
}
