//! Core type definitions used across the CloudDisk workspace.

pub mod id;
pub mod pagination;

pub use id::{NodeId, OwnerId};
pub use pagination::{PageRequest, PageResponse};
