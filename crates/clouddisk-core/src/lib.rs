//! # clouddisk-core
//!
//! Core crate for CloudDisk. Contains the blob store trait, configuration
//! schemas, typed identifiers, pagination types, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other CloudDisk crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
