//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! an optional TOML file, an optional environment overlay, and
//! `CLOUDDISK__*` environment variables.

pub mod database;
pub mod logging;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::storage::{LocalStorageConfig, S3StorageConfig, StorageConfig, StorageDriver};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Metadata database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges the base file at `path` with an environment overlay at
    /// `config/{env}` and environment variables prefixed with `CLOUDDISK`.
    /// Missing files are skipped.
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CLOUDDISK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.storage.driver == StorageDriver::S3 && self.storage.s3.bucket.trim().is_empty() {
            return Err(AppError::configuration(
                "storage.s3.bucket is required when storage.driver = \"s3\"",
            ));
        }
        if self.storage.max_upload_size_bytes == 0 {
            return Err(AppError::configuration(
                "storage.max_upload_size_bytes must be greater than zero",
            ));
        }
        Ok(())
    }
}
