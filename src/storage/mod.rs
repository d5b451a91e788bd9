//! Object storage for uploaded help resources.
//!
//! Supports multiple backends:
//! - `local`: Local filesystem storage, served by the application itself
//! - `s3`: S3-compatible object storage (MinIO, AWS S3, etc.)

pub mod local;
pub mod s3;

use crate::app_config::StorageConfig;
use async_trait::async_trait;
use rusoto_core::Region;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Storage operation errors.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error
    Io(std::io::Error),
    /// S3 error
    S3(String),
    /// Misconfigured backend
    Config(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
            StorageError::S3(msg) => write!(f, "S3 error: {}", msg),
            StorageError::Config(msg) => write!(f, "Storage configuration error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Trait for storage backends.
///
/// Objects are stored flat under their key inside the configured bucket and
/// are publicly readable at [`StorageBackend::public_url`].
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store the file at `path` under `key`.
    async fn put_file(&self, key: &str, path: &Path) -> Result<(), StorageError>;

    /// Bucket the objects are stored in.
    fn bucket_name(&self) -> &str;

    /// Base URL the bucket is served from.
    fn base_url(&self) -> &str;

    /// Public URL of a stored object: `{base_url}/{bucket}/{key}`.
    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url().trim_end_matches('/'),
            self.bucket_name(),
            key
        )
    }
}

/// Builds the backend selected in configuration.
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    match config.backend.as_str() {
        "local" => Ok(Arc::new(local::LocalStorage::new(
            PathBuf::from(&config.local_path),
            config.bucket.to_owned(),
            config.public_base_url.to_owned(),
        )?)),
        "s3" => {
            let region = if config.s3_endpoint.is_empty() {
                config
                    .s3_region
                    .parse::<Region>()
                    .map_err(|e| StorageError::Config(e.to_string()))?
            } else {
                Region::Custom {
                    name: config.s3_region.to_owned(),
                    endpoint: config.s3_endpoint.to_owned(),
                }
            };
            Ok(Arc::new(s3::S3Storage::new(
                region,
                config.bucket.to_owned(),
                config.public_base_url.to_owned(),
            )))
        }
        other => Err(StorageError::Config(format!(
            "unknown storage backend '{}'",
            other
        ))),
    }
}
