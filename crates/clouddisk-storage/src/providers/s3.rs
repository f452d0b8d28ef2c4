//! S3-compatible object blob store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream as S3Body;
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use clouddisk_core::config::S3StorageConfig;
use clouddisk_core::error::{AppError, ErrorKind};
use clouddisk_core::result::AppResult;
use clouddisk_core::traits::blob::{BlobStore, ByteStream, check_put_size};

/// Blob store backed by one S3 bucket.
///
/// Works against AWS and S3-compatible services such as MinIO; a custom
/// endpoint switches the client to path-style addressing.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Connect to the configured service and make sure the bucket exists.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing S3 blob store"
        );

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if !config.access_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                &config.access_key,
                &config.secret_key,
                None,
                None,
                "clouddisk",
            ));
        }
        let sdk_config = loader.load().await;

        let mut builder = S3ConfigBuilder::from(&sdk_config);
        if let Some(endpoint) = config.endpoint_url() {
            debug!(endpoint = %endpoint, "Using custom S3 endpoint");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let store = Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        };
        store.ensure_bucket().await?;
        Ok(store)
    }

    /// Bucket name used by this store.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn ensure_bucket(&self) -> AppResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {
                info!(bucket = %self.bucket, "Creating missing S3 bucket");
                self.client
                    .create_bucket()
                    .bucket(&self.bucket)
                    .send()
                    .await
                    .map_err(|e| {
                        AppError::with_source(
                            ErrorKind::StorageUnavailable,
                            format!("Failed to create bucket: {}", self.bucket),
                            e,
                        )
                    })?;
                Ok(())
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::StorageUnavailable,
                format!("S3 bucket not accessible: {}", self.bucket),
                e,
            )),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn backend(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok())
    }

    async fn put(&self, key: &str, data: Bytes, size: u64) -> AppResult<()> {
        check_put_size(key, &data, size)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(size as i64)
            .body(S3Body::from(data))
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageUnavailable,
                    format!("Failed to upload blob: {key}"),
                    e,
                )
            })?;

        debug!(key, bytes = size, "Uploaded blob to S3");
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<ByteStream> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    AppError::not_found(format!("Blob not found: {key}"))
                } else {
                    AppError::with_source(
                        ErrorKind::StorageUnavailable,
                        format!("Failed to download blob: {key}"),
                        e,
                    )
                }
            })?;

        Ok(Box::pin(ReaderStream::new(output.body.into_async_read())))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        // S3 reports success for keys that do not exist.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageUnavailable,
                    format!("Failed to delete blob: {key}"),
                    e,
                )
            })?;
        debug!(key, "Deleted blob from S3");
        Ok(())
    }

    async fn stat(&self, key: &str) -> AppResult<u64> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    AppError::not_found(format!("Blob not found: {key}"))
                } else {
                    AppError::with_source(
                        ErrorKind::StorageUnavailable,
                        format!("Failed to stat blob: {key}"),
                        e,
                    )
                }
            })?;

        Ok(output.content_length().unwrap_or(0).max(0) as u64)
    }
}
