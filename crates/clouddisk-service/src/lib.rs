//! # clouddisk-service
//!
//! Business logic for CloudDisk. [`TreeResolver`] turns slash-separated
//! paths into directory nodes; [`FileService`] orchestrates the metadata
//! repository and the blob store for uploads, downloads, and deletes.
//!
//! Services follow constructor injection: both stores are handed in as
//! `Arc` handles at construction time.

pub mod cancel;
pub mod file;
pub mod folder;
pub mod path;

pub use cancel::run_cancellable;
pub use file::{BatchItem, Download, FileService, ListTarget, UploadRequest};
pub use folder::TreeResolver;
