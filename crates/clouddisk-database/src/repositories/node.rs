//! SQLite node repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use clouddisk_core::error::{AppError, ErrorKind};
use clouddisk_core::result::AppResult;
use clouddisk_core::types::{NodeId, OwnerId};
use clouddisk_entity::node::{CreateNode, Node};

use super::NodeRepository;

/// Repository for node CRUD and tree queries backed by the `nodes` table.
#[derive(Debug, Clone)]
pub struct SqlNodeRepository {
    pool: SqlitePool,
}

impl SqlNodeRepository {
    /// Create a new node repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NodeRepository for SqlNodeRepository {
    async fn create(&self, data: &CreateNode) -> AppResult<Node> {
        let now = Utc::now();
        sqlx::query_as::<_, Node>(
            "INSERT INTO nodes (owner_id, parent_id, name, path, is_dir, size_bytes, mime_type, \
             content_hash, storage_key, is_public, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(&data.path)
        .bind(data.is_dir)
        .bind(data.size_bytes)
        .bind(&data.mime_type)
        .bind(&data.content_hash)
        .bind(&data.storage_key)
        .bind(data.is_public)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::conflict(format!("Folder '{}' already exists", data.path))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create node", e),
        })
    }

    async fn find_by_id(&self, id: NodeId, owner: OwnerId) -> AppResult<Node> {
        sqlx::query_as::<_, Node>("SELECT * FROM nodes WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find node", e))?
            .ok_or_else(|| AppError::not_found(format!("Node {id} not found")))
    }

    async fn find_dir_by_parent_and_name(
        &self,
        owner: OwnerId,
        parent_id: NodeId,
        name: &str,
    ) -> AppResult<Option<Node>> {
        sqlx::query_as::<_, Node>(
            "SELECT * FROM nodes WHERE owner_id = $1 AND parent_id = $2 AND name = $3 AND is_dir = 1",
        )
        .bind(owner)
        .bind(parent_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    async fn list_children(
        &self,
        owner: OwnerId,
        parent_id: NodeId,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Node>, u64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM nodes WHERE owner_id = $1 AND parent_id = $2")
                .bind(owner)
                .bind(parent_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count children", e)
                })?;

        let nodes = sqlx::query_as::<_, Node>(
            "SELECT * FROM nodes WHERE owner_id = $1 AND parent_id = $2 \
             ORDER BY is_dir DESC, name ASC, id ASC LIMIT $3 OFFSET $4",
        )
        .bind(owner)
        .bind(parent_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))?;

        Ok((nodes, total as u64))
    }

    async fn delete(&self, id: NodeId, owner: OwnerId) -> AppResult<()> {
        sqlx::query("DELETE FROM nodes WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete node", e))?;
        Ok(())
    }

    async fn find_by_content_hash(&self, owner: OwnerId, hash: &str) -> AppResult<Option<Node>> {
        sqlx::query_as::<_, Node>(
            "SELECT * FROM nodes WHERE owner_id = $1 AND content_hash = $2 AND is_dir = 0 \
             ORDER BY id ASC LIMIT 1",
        )
        .bind(owner)
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find node by hash", e)
        })
    }

    async fn count_by_storage_key(&self, owner: OwnerId, storage_key: &str) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM nodes WHERE owner_id = $1 AND storage_key = $2 AND is_dir = 0",
        )
        .bind(owner)
        .bind(storage_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count blob references", e)
        })?;
        Ok(count as u64)
    }
}
