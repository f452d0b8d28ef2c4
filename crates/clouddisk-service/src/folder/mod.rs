//! Folder tree resolution.

pub mod tree;

pub use tree::TreeResolver;
