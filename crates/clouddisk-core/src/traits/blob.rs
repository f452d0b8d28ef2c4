//! Blob store trait for pluggable content backends.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};

use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;

/// A byte stream type used for reading blob contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Key-addressed byte storage.
///
/// Implementations exist for a local directory tree and for S3-compatible
/// object stores; both expose the same semantics:
///
/// * `put` is atomic: either all `size` bytes become readable under `key`
///   or the call fails and nothing is visible under `key`.
/// * `get` and `stat` on a missing key fail with [`ErrorKind::NotFound`].
/// * `delete` on a missing key succeeds.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend name (e.g. `"local"`, `"s3"`).
    fn backend(&self) -> &str;

    /// Check whether the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store `data` under `key`. `size` must equal `data.len()`.
    async fn put(&self, key: &str, data: Bytes, size: u64) -> AppResult<()>;

    /// Open the blob stored under `key`.
    async fn get(&self, key: &str) -> AppResult<ByteStream>;

    /// Remove the blob stored under `key`, if any.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Return the size in bytes of the blob stored under `key`.
    async fn stat(&self, key: &str) -> AppResult<u64>;
}

/// Reject a `put` whose declared size does not match the payload.
pub fn check_put_size(key: &str, data: &Bytes, size: u64) -> AppResult<()> {
    if data.len() as u64 != size {
        return Err(AppError::invalid_input(format!(
            "Declared size {size} does not match {} bytes supplied for '{key}'",
            data.len()
        )));
    }
    Ok(())
}

/// Drain a [`ByteStream`] into memory.
pub async fn collect_stream(stream: ByteStream) -> AppResult<Bytes> {
    let chunks: Vec<Bytes> = stream
        .try_collect()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::StorageUnavailable, "Stream read error", e))?;
    Ok(Bytes::from(chunks.concat()))
}
