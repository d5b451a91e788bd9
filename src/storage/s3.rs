//! S3-compatible storage backend.

use super::{StorageBackend, StorageError};
use actix_web::web;
use async_trait::async_trait;
use rusoto_core::Region;
use rusoto_s3::{PutObjectRequest, S3Client, S3};
use std::path::Path;

/// S3-compatible storage backend.
pub struct S3Storage {
    s3: S3Client,
    bucket_name: String,
    pub_url: String,
}

impl S3Storage {
    /// Create a new S3 storage backend.
    pub fn new(region: Region, bucket_name: String, pub_url: String) -> S3Storage {
        log::info!("S3Storage initialized for bucket: {}", bucket_name);

        S3Storage {
            s3: S3Client::new(region),
            bucket_name,
            pub_url,
        }
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn put_file(&self, key: &str, path: &Path) -> Result<(), StorageError> {
        log::info!("S3Storage: put_file: {}", key);

        let path = path.to_path_buf();
        let data = web::block(move || std::fs::read(path))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        let put_request = PutObjectRequest {
            bucket: self.bucket_name.clone(),
            key: key.to_owned(),
            content_length: Some(data.len() as i64),
            body: Some(data.into()),
            ..Default::default()
        };

        self.s3
            .put_object(put_request)
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(())
    }

    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    fn base_url(&self) -> &str {
        &self.pub_url
    }
}
