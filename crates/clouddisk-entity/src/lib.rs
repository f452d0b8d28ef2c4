//! # clouddisk-entity
//!
//! Domain entity models for CloudDisk. Every struct in this crate
//! represents a metadata table row or a domain value object. Row entities
//! derive `sqlx::FromRow`.

pub mod node;

pub use node::{CreateNode, Node, NodeListing};
