//! Helpers for turning multipart uploads into stored resources.

use crate::help::Resource;
use crate::web::error::ApiError;
use actix_multipart::Field;
use chrono::Utc;
use futures::TryStreamExt;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// An upload materialized on local disk.
///
/// The temporary file is deleted when this value is dropped.
#[derive(Debug)]
pub struct UploadedFile {
    /// Original file name supplied by the client.
    pub name: String,
    pub content_type: Option<String>,
    pub size: u64,
    file: NamedTempFile,
}

impl UploadedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Returns the text after the last `.` of `filename`, if any.
pub fn get_extension(filename: &str) -> Option<&str> {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Generates a globally unique storage key that keeps the original extension.
pub fn unique_key(filename: &str) -> String {
    let id = uuid::Uuid::new_v4();
    match get_extension(filename) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

/// Streams a multipart field into a temporary file.
///
/// Returns `Ok(None)` for empty uploads. Uploads larger than `max_bytes` are
/// rejected with 400.
pub async fn save_field_as_temp_file(
    field: &mut Field,
    max_bytes: usize,
) -> Result<Option<UploadedFile>, ApiError> {
    let name = field
        .content_disposition()
        .get_filename()
        .unwrap_or_default()
        .to_owned();
    let content_type = field.content_type().map(|m| m.to_string());

    let mut file = NamedTempFile::new().map_err(|e| {
        log::error!("save_field_as_temp_file: failed to create temp file: {}", e);
        ApiError::Internal
    })?;

    let mut size: usize = 0;
    while let Some(chunk) = field.try_next().await.map_err(|e| {
        log::error!("save_field_as_temp_file: multipart read error: {}", e);
        ApiError::bad_request("Invalid Input detected.")
    })? {
        size += chunk.len();
        if size > max_bytes {
            return Err(ApiError::BadRequest(vec![format!(
                "'{}' exceeds the maximum upload size.",
                name
            )]));
        }
        file.write_all(&chunk).map_err(|e| {
            log::error!("save_field_as_temp_file: write error: {}", e);
            ApiError::Internal
        })?;
    }

    if size == 0 {
        return Ok(None);
    }

    file.flush().map_err(|e| {
        log::error!("save_field_as_temp_file: flush error: {}", e);
        ApiError::Internal
    })?;

    Ok(Some(UploadedFile {
        name,
        content_type,
        size: size as u64,
        file,
    }))
}

/// Builds the resource record for an upload stored at `url`.
pub fn get_resource(upload: &UploadedFile, url: String) -> Resource {
    Resource {
        id: None,
        url,
        name: upload.name.to_owned(),
        extension: get_extension(&upload.name).map(str::to_owned),
        content_type: upload
            .content_type
            .to_owned()
            .or_else(|| Some(mime::APPLICATION_OCTET_STREAM.to_string())),
        size: upload.size as i64,
        created_at: Utc::now().naive_utc(),
    }
}

#[cfg(test)]
pub(crate) fn uploaded_file_for_test(name: &str, contents: &[u8]) -> UploadedFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    UploadedFile {
        name: name.to_owned(),
        content_type: None,
        size: contents.len() as u64,
        file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_extension() {
        assert_eq!(get_extension("photo.png"), Some("png"));
        assert_eq!(get_extension("archive.tar.gz"), Some("gz"));
        assert_eq!(get_extension(".bashrc"), Some("bashrc"));
        assert_eq!(get_extension("README"), None);
        assert_eq!(get_extension("trailing."), None);
        assert_eq!(get_extension(""), None);
    }

    #[test]
    fn test_unique_key_keeps_extension() {
        let a = unique_key("photo.PNG");
        let b = unique_key("photo.PNG");
        assert_ne!(a, b);
        assert!(a.ends_with(".PNG"));
        // uuid (36) + '.' + extension
        assert_eq!(a.len(), 36 + 1 + 3);

        let bare = unique_key("README");
        assert_eq!(bare.len(), 36);
        assert!(!bare.contains('.'));
    }

    #[test]
    fn test_get_resource() {
        let upload = uploaded_file_for_test("notes.txt", b"twelve bytes");
        let resource = get_resource(&upload, "https://s3.amazonaws.com/b/k.txt".to_owned());

        assert_eq!(resource.id, None);
        assert_eq!(resource.url, "https://s3.amazonaws.com/b/k.txt");
        assert_eq!(resource.name, "notes.txt");
        assert_eq!(resource.extension.as_deref(), Some("txt"));
        assert_eq!(resource.content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(resource.size, 12);
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let upload = uploaded_file_for_test("notes.txt", b"abc");
        let path = upload.path().to_path_buf();
        assert!(path.exists());
        drop(upload);
        assert!(!path.exists());
    }
}
