//! Content digests and storage keys.

use md5::{Digest, Md5};

use clouddisk_core::types::OwnerId;

use crate::path::extension;

/// Lowercase hex MD5 digest of `data`.
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Blob key for content with digest `digest` uploaded by `owner` as `name`.
///
/// Layout: `files/{owner}/{digest}{ext}`. Identical bytes uploaded with the
/// same extension by the same owner always map to the same key.
pub fn storage_key(owner: OwnerId, digest: &str, name: &str) -> String {
    format!("files/{owner}/{digest}{}", extension(name))
}
