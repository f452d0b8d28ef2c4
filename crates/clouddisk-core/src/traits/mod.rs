//! Core traits defined in `clouddisk-core` and implemented by other crates.

pub mod blob;

pub use blob::{BlobStore, ByteStream};
