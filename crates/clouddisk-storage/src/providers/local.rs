//! Local filesystem blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

use clouddisk_core::error::{AppError, ErrorKind};
use clouddisk_core::result::AppResult;
use clouddisk_core::traits::blob::{BlobStore, ByteStream, check_put_size};

/// Blob store mapping each key to a file under a root directory.
///
/// Keys are `/`-separated relative paths. Writes go to a temporary sibling
/// file that is renamed into place, so readers never see partial content.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a new local blob store rooted at the given path.
    pub async fn new(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let root = root_path.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageUnavailable,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// The directory blobs are stored under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a file path within the root.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, seg| path.join(seg)))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageUnavailable,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

/// Reject keys that could escape the root or name a directory.
fn validate_key(key: &str) -> AppResult<()> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        return Err(AppError::invalid_input(format!("Invalid blob key: '{key}'")));
    }
    for seg in key.split('/') {
        if seg.is_empty() || seg == "." || seg == ".." {
            return Err(AppError::invalid_input(format!("Invalid blob key: '{key}'")));
        }
    }
    Ok(())
}

/// Map an I/O failure on `key`, turning a missing file into `NotFound`.
fn io_error(action: &str, key: &str, e: std::io::Error) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AppError::not_found(format!("Blob not found: {key}"))
    } else {
        AppError::with_source(
            ErrorKind::StorageUnavailable,
            format!("Failed to {action} blob: {key}"),
            e,
        )
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn backend(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn put(&self, key: &str, data: Bytes, size: u64) -> AppResult<()> {
        check_put_size(key, &data, size)?;
        let full_path = self.resolve(key)?;
        self.ensure_parent(&full_path).await?;

        let file_name = full_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp_path = full_path.with_file_name(format!("{file_name}.{}.tmp", Uuid::new_v4()));

        let written = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(&data).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp_path, &full_path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(key, error = %cleanup, "Failed to remove temporary blob file");
                }
            }
            return Err(AppError::with_source(
                ErrorKind::StorageUnavailable,
                format!("Failed to write blob: {key}"),
                e,
            ));
        }

        debug!(key, bytes = size, "Wrote blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(key)?;
        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| io_error("open", key, e))?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_path = self.resolve(key)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(key, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("delete", key, e)),
        }
    }

    async fn stat(&self, key: &str) -> AppResult<u64> {
        let full_path = self.resolve(key)?;
        let meta = fs::metadata(&full_path)
            .await
            .map_err(|e| io_error("stat", key, e))?;
        if !meta.is_file() {
            return Err(AppError::not_found(format!("Blob not found: {key}")));
        }
        Ok(meta.len())
    }
}
