//! Attachment repository.

use std::sync::Arc;

use crate::entities::{Attachment, attachment};
use huddle_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, sea_query::Expr,
};

/// Attachment repository for database operations.
#[derive(Clone)]
pub struct AttachmentRepository {
    db: Arc<DatabaseConnection>,
}

impl AttachmentRepository {
    /// Create a new attachment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an attachment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<attachment::Model>> {
        Attachment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find attachments by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<attachment::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Attachment::find()
            .filter(attachment::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a batch of attachment rows.
    pub async fn create_many(
        &self,
        models: Vec<attachment::ActiveModel>,
    ) -> AppResult<()> {
        if models.is_empty() {
            return Ok(());
        }

        Attachment::insert_many(models)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get attachments for a message (insertion order).
    pub async fn find_by_message(&self, message_id: &str) -> AppResult<Vec<attachment::Model>> {
        Attachment::find()
            .filter(attachment::Column::MessageId.eq(message_id))
            .order_by_asc(attachment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get attachments for a set of messages in one round trip.
    pub async fn find_by_message_ids(
        &self,
        message_ids: &[String],
    ) -> AppResult<Vec<attachment::Model>> {
        if message_ids.is_empty() {
            return Ok(vec![]);
        }

        Attachment::find()
            .filter(attachment::Column::MessageId.is_in(message_ids.to_vec()))
            .order_by_asc(attachment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attach pre-uploaded blobs to a message.
    pub async fn bind_to_message(&self, ids: &[String], message_id: &str) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        Attachment::update_many()
            .col_expr(
                attachment::Column::MessageId,
                Expr::value(Some(message_id.to_string())),
            )
            .filter(attachment::Column::Id.is_in(ids.to_vec()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
