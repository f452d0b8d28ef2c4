//! # clouddisk-storage
//!
//! Blob store backends for CloudDisk. A local directory tree is always
//! available; S3-compatible object stores require the `s3` feature.

pub mod factory;
pub mod providers;

pub use factory::open_blob_store;
pub use providers::LocalBlobStore;
#[cfg(feature = "s3")]
pub use providers::S3BlobStore;
