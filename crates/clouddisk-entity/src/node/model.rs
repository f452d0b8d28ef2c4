//! Node entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use clouddisk_core::types::{NodeId, OwnerId, PageResponse};

/// A file or directory in an owner's tree.
///
/// Navigation always follows `parent_id`; `path` is a denormalized copy
/// kept for display and listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Node {
    /// Unique node identifier, never 0 for a stored row.
    pub id: NodeId,
    /// The owning account.
    pub owner_id: OwnerId,
    /// Containing directory, or 0 for top-level entries.
    pub parent_id: NodeId,
    /// This entry's own segment name.
    pub name: String,
    /// Full materialized path (e.g. `/docs/2024/report.pdf`).
    pub path: String,
    /// Whether this node is a directory.
    pub is_dir: bool,
    /// Content size in bytes (0 for directories).
    pub size_bytes: i64,
    /// MIME type of the content.
    pub mime_type: Option<String>,
    /// Hex digest of the content.
    pub content_hash: Option<String>,
    /// Locator of the content in the blob store.
    pub storage_key: Option<String>,
    /// Visibility flag; stored but not interpreted by the core.
    pub is_public: bool,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// When the node was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// The synthetic node standing for an owner's virtual root.
    pub fn root(owner_id: OwnerId) -> Self {
        let now = Utc::now();
        Self {
            id: NodeId::ROOT,
            owner_id,
            parent_id: NodeId::ROOT,
            name: String::new(),
            path: "/".to_string(),
            is_dir: true,
            size_bytes: 0,
            mime_type: None,
            content_hash: None,
            storage_key: None,
            is_public: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this is the synthetic virtual root.
    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    /// Build the materialized path of a child named `name`.
    pub fn child_path(&self, name: &str) -> String {
        join_path(&self.path, name)
    }
}

/// Append `name` to a materialized parent path.
pub fn join_path(parent_path: &str, name: &str) -> String {
    let parent = parent_path.trim_end_matches('/');
    format!("{parent}/{name}")
}

/// Data required to create a new node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNode {
    /// The owning account.
    pub owner_id: OwnerId,
    /// Containing directory (0 for top level).
    pub parent_id: NodeId,
    /// Segment name.
    pub name: String,
    /// Materialized path.
    pub path: String,
    /// Whether this is a directory.
    pub is_dir: bool,
    /// Content size in bytes.
    pub size_bytes: i64,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Hex content digest.
    pub content_hash: Option<String>,
    /// Blob store key.
    pub storage_key: Option<String>,
    /// Visibility flag.
    pub is_public: bool,
}

impl CreateNode {
    /// Describe a new directory.
    pub fn directory(owner_id: OwnerId, parent_id: NodeId, name: &str, path: String) -> Self {
        Self {
            owner_id,
            parent_id,
            name: name.to_string(),
            path,
            is_dir: true,
            size_bytes: 0,
            mime_type: None,
            content_hash: None,
            storage_key: None,
            is_public: false,
        }
    }

    /// Materialize a stored row from this description.
    pub fn into_node(self, id: NodeId, now: DateTime<Utc>) -> Node {
        Node {
            id,
            owner_id: self.owner_id,
            parent_id: self.parent_id,
            name: self.name,
            path: self.path,
            is_dir: self.is_dir,
            size_bytes: self.size_bytes,
            mime_type: self.mime_type,
            content_hash: self.content_hash,
            storage_key: self.storage_key,
            is_public: self.is_public,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A page of children returned by listing operations.
pub type NodeListing = PageResponse<Node>;
