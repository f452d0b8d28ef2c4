//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Which blob store backend to construct at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// Filesystem-rooted store.
    #[default]
    Local,
    /// S3-compatible object store.
    S3,
}

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend selection.
    #[serde(default)]
    pub driver: StorageDriver,
    /// Maximum upload size in bytes (default 5 GB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Local filesystem storage configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// S3-compatible storage configuration.
    #[serde(default)]
    pub s3: S3StorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            max_upload_size_bytes: default_max_upload(),
            local: LocalStorageConfig::default(),
            s3: S3StorageConfig::default(),
        }
    }
}

/// Local filesystem storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Base directory under which keys are mapped to files.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

/// S3-compatible object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StorageConfig {
    /// Endpoint host or URL (for non-AWS services like MinIO). Empty for AWS.
    #[serde(default)]
    pub endpoint: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Bucket name. Created at startup if missing.
    #[serde(default)]
    pub bucket: String,
    /// Access key ID.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
    /// Use HTTPS when `endpoint` has no scheme.
    #[serde(default)]
    pub use_ssl: bool,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            use_ssl: false,
        }
    }
}

impl S3StorageConfig {
    /// The endpoint as a full URL, adding a scheme from `use_ssl` when the
    /// configured value is a bare `host:port`.
    pub fn endpoint_url(&self) -> Option<String> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return None;
        }
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Some(endpoint.to_string());
        }
        let scheme = if self.use_ssl { "https" } else { "http" };
        Some(format!("{scheme}://{endpoint}"))
    }
}

fn default_max_upload() -> u64 {
    5_368_709_120 // 5 GB
}

fn default_local_root() -> String {
    "./data/files".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}
