//! Local filesystem storage backend.

use super::{StorageBackend, StorageError};
use actix_web::web;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

/// Local filesystem storage backend.
///
/// Objects land in `{base_path}/{bucket}/{key}`; the application serves
/// `base_path` so that the public URL layout matches S3.
pub struct LocalStorage {
    base_path: PathBuf,
    bucket_name: String,
    pub_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    ///
    /// The bucket directory will be created if it doesn't exist.
    pub fn new(
        base_path: PathBuf,
        bucket_name: String,
        pub_url: String,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(base_path.join(&bucket_name))?;
        log::info!("LocalStorage initialized at {:?}", base_path);
        Ok(Self {
            base_path,
            bucket_name,
            pub_url,
        })
    }

    fn get_file_path(&self, key: &str) -> PathBuf {
        self.base_path.join(&self.bucket_name).join(key)
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn put_file(&self, key: &str, path: &Path) -> Result<(), StorageError> {
        let target = self.get_file_path(key);
        log::info!("LocalStorage: put_file: {:?}", target);

        let source = path.to_path_buf();
        web::block(move || fs::copy(source, target))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        Ok(())
    }

    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    fn base_url(&self) -> &str {
        &self.pub_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[actix_rt::test]
    async fn test_put_file_copies_into_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(
            dir.path().to_path_buf(),
            "resources".to_owned(),
            "http://localhost:8080/uploads".to_owned(),
        )
        .unwrap();

        let mut upload = tempfile::NamedTempFile::new().unwrap();
        upload.write_all(b"hello").unwrap();

        storage.put_file("abc.txt", upload.path()).await.unwrap();

        let stored = fs::read(dir.path().join("resources").join("abc.txt")).unwrap();
        assert_eq!(stored, b"hello");
    }

    #[test]
    fn test_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(
            dir.path().to_path_buf(),
            "resources".to_owned(),
            "http://localhost:8080/uploads/".to_owned(),
        )
        .unwrap();

        assert_eq!(
            storage.public_url("abc.png"),
            "http://localhost:8080/uploads/resources/abc.png"
        );
    }

    #[actix_rt::test]
    async fn test_put_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(
            dir.path().to_path_buf(),
            "resources".to_owned(),
            String::new(),
        )
        .unwrap();

        let result = storage
            .put_file("abc.txt", &dir.path().join("does-not-exist"))
            .await;
        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
