//! Blob store construction from configuration.

use std::sync::Arc;

use tracing::info;

use clouddisk_core::config::{StorageConfig, StorageDriver};
use clouddisk_core::result::AppResult;
use clouddisk_core::traits::blob::BlobStore;

use crate::providers::LocalBlobStore;

/// Build the blob store selected by `config.driver`.
///
/// The store is constructed once at startup and shared by handle.
pub async fn open_blob_store(config: &StorageConfig) -> AppResult<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.driver {
        StorageDriver::Local => Arc::new(LocalBlobStore::new(&config.local.root_path).await?),
        StorageDriver::S3 => open_s3(config).await?,
    };
    info!(backend = store.backend(), "Blob store ready");
    Ok(store)
}

#[cfg(feature = "s3")]
async fn open_s3(config: &StorageConfig) -> AppResult<Arc<dyn BlobStore>> {
    Ok(Arc::new(crate::providers::S3BlobStore::new(&config.s3).await?))
}

#[cfg(not(feature = "s3"))]
async fn open_s3(_config: &StorageConfig) -> AppResult<Arc<dyn BlobStore>> {
    Err(clouddisk_core::error::AppError::configuration(
        "storage.driver = \"s3\" requires building with the `s3` feature",
    ))
}
