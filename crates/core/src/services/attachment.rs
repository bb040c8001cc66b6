//! Attachment upload service.
//!
//! Blobs are uploaded before the message that carries them exists. The
//! row is created unbound (`message_id` null) and a later send binds it.

use std::sync::Arc;

use huddle_common::{AppError, AppResult, BlobStore, IdGenerator};
use huddle_db::entities::attachment;
use huddle_db::repositories::AttachmentRepository;
use sea_orm::Set;

/// Upper bound on attachment size, in bytes.
pub const MAX_ATTACHMENT_SIZE: usize = 50 * 1024 * 1024;

/// TTL for presigned download links, in seconds.
const DOWNLOAD_URL_TTL_SECS: u64 = 3600;

/// Input for the upload use case.
#[derive(Debug, Clone)]
pub struct UploadAttachmentInput {
    pub file_name: String,
    pub file_type: String,
    pub data: Vec<u8>,
}

/// Attachment service for pre-upload and download links.
#[derive(Clone)]
pub struct AttachmentService {
    attachment_repo: AttachmentRepository,
    blob_store: Arc<dyn BlobStore>,
    id_gen: IdGenerator,
}

impl AttachmentService {
    /// Create a new attachment service.
    #[must_use]
    pub fn new(attachment_repo: AttachmentRepository, blob_store: Arc<dyn BlobStore>) -> Self {
        Self {
            attachment_repo,
            blob_store,
            id_gen: IdGenerator::new(),
        }
    }

    /// Store the bytes and record an unbound attachment row.
    pub async fn upload(&self, input: UploadAttachmentInput) -> AppResult<attachment::Model> {
        if input.file_name.trim().is_empty() {
            return Err(AppError::Validation(
                "File name must not be empty".to_string(),
            ));
        }
        if input.data.is_empty() {
            return Err(AppError::Validation("Attachment is empty".to_string()));
        }
        if input.data.len() > MAX_ATTACHMENT_SIZE {
            return Err(AppError::Validation("Attachment too large".to_string()));
        }

        let blob = self
            .blob_store
            .upload(&input.data, &input.file_name, &input.file_type)
            .await?;

        let model = attachment::Model {
            id: self.id_gen.generate(),
            message_id: None,
            file_name: input.file_name,
            file_type: input.file_type,
            size: blob.size as i64,
            blob_location: blob.location,
            created_at: chrono::Utc::now().into(),
        };

        self.attachment_repo
            .create_many(vec![attachment::ActiveModel {
                id: Set(model.id.clone()),
                message_id: Set(None),
                file_name: Set(model.file_name.clone()),
                file_type: Set(model.file_type.clone()),
                size: Set(model.size),
                blob_location: Set(model.blob_location.clone()),
                created_at: Set(model.created_at),
            }])
            .await?;

        Ok(model)
    }

    /// Look up an attachment row.
    pub async fn get_by_id(&self, id: &str) -> AppResult<attachment::Model> {
        self.attachment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attachment {id}")))
    }

    /// Time-limited download URL for an attachment's blob.
    #[must_use]
    pub fn download_url(&self, attachment: &attachment::Model) -> String {
        self.blob_store
            .presign_download(&attachment.blob_location, DOWNLOAD_URL_TTL_SECS)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use huddle_common::LocalBlobStore;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn temp_store() -> (Arc<LocalBlobStore>, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("huddle-attach-{}", uuid::Uuid::new_v4()));
        (
            Arc::new(LocalBlobStore::new(dir.clone(), "/files".to_string())),
            dir,
        )
    }

    #[tokio::test]
    async fn test_upload_creates_unbound_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let (store, dir) = temp_store();
        let service = AttachmentService::new(AttachmentRepository::new(Arc::new(db)), store);

        let model = service
            .upload(UploadAttachmentInput {
                file_name: "photo.png".to_string(),
                file_type: "image/png".to_string(),
                data: vec![1, 2, 3, 4],
            })
            .await
            .unwrap();

        assert_eq!(model.message_id, None);
        assert_eq!(model.size, 4);
        assert!(model.blob_location.ends_with("photo.png"));

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_data() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let (store, _dir) = temp_store();
        let service = AttachmentService::new(AttachmentRepository::new(Arc::new(db)), store);

        let result = service
            .upload(UploadAttachmentInput {
                file_name: "empty.bin".to_string(),
                file_type: "application/octet-stream".to_string(),
                data: vec![],
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<attachment::Model>::new()])
            .into_connection();
        let (store, _dir) = temp_store();
        let service = AttachmentService::new(AttachmentRepository::new(Arc::new(db)), store);

        let result = service.get_by_id("missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_download_url_is_presigned() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let (store, _dir) = temp_store();
        let service = AttachmentService::new(AttachmentRepository::new(Arc::new(db)), store);

        let model = attachment::Model {
            id: "att1".to_string(),
            message_id: None,
            file_name: "photo.png".to_string(),
            file_type: "image/png".to_string(),
            size: 4,
            blob_location: "abc/photo.png".to_string(),
            created_at: chrono::Utc::now().into(),
        };

        let url = service.download_url(&model);
        assert!(url.starts_with("/files/abc/photo.png?expires="));
    }
}
