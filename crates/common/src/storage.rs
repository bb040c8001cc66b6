//! Blob storage abstraction for message attachments.
//!
//! The messaging core only records and forwards opaque `location` strings;
//! it never interprets them. Backends own the actual byte placement.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Metadata for a stored blob.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Opaque storage location (path or object key).
    pub location: String,
    /// Blob size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
}

/// Blob store capability.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload bytes and return the stored blob's metadata.
    async fn upload(&self, data: &[u8], name: &str, content_type: &str) -> AppResult<StoredBlob>;

    /// Produce a time-limited download URL for a previously stored location.
    fn presign_download(&self, location: &str, ttl_seconds: u64) -> String;

    /// Check whether a location exists.
    async fn exists(&self, location: &str) -> AppResult<bool>;
}

/// Local filesystem blob store.
pub struct LocalBlobStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    /// Create a new local blob store.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, data: &[u8], name: &str, content_type: &str) -> AppResult<StoredBlob> {
        let key = format!("{}/{}", uuid::Uuid::new_v4().simple(), name);
        let path = self.base_path.join(&key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;

        Ok(StoredBlob {
            location: key,
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    fn presign_download(&self, location: &str, ttl_seconds: u64) -> String {
        let expires = chrono::Utc::now().timestamp() + ttl_seconds as i64;
        format!(
            "{}/{}?expires={}",
            self.base_url.trim_end_matches('/'),
            location,
            expires
        )
    }

    async fn exists(&self, location: &str) -> AppResult<bool> {
        let path = self.base_path.join(location);
        Ok(path.exists())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_exists() {
        let dir = std::env::temp_dir().join(format!("huddle-blob-{}", uuid::Uuid::new_v4()));
        let store = LocalBlobStore::new(dir.clone(), "/files".to_string());

        let blob = store.upload(b"hello", "note.txt", "text/plain").await.unwrap();
        assert_eq!(blob.size, 5);
        assert!(blob.location.ends_with("note.txt"));
        assert!(store.exists(&blob.location).await.unwrap());

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[test]
    fn test_presign_download_embeds_expiry() {
        let store = LocalBlobStore::new(PathBuf::from("./files"), "/files/".to_string());
        let url = store.presign_download("abc/note.txt", 60);
        assert!(url.starts_with("/files/abc/note.txt?expires="));
    }
}
