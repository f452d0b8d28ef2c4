//! File services: content addressing and upload/delete orchestration.

pub mod digest;
pub mod service;

pub use service::{BatchItem, Download, FileService, ListTarget, UploadRequest};
