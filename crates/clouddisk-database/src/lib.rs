//! # clouddisk-database
//!
//! SQLite connection management and the metadata repositories that
//! persist the node tree.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{MemoryNodeRepository, NodeRepository, SqlNodeRepository};
