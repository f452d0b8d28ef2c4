//! Node (file or directory) entities.

pub mod model;

pub use model::{CreateNode, Node, NodeListing};
