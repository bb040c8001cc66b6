//! Reaction repository.

use std::sync::Arc;

use crate::entities::{Reaction, reaction};
use huddle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    SqlErr,
};

/// Reaction repository for database operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a reaction.
    ///
    /// The `(message_id, user_id, emoji)` unique index turns a concurrent
    /// duplicate insert into [`AppError::Conflict`] so callers can treat the
    /// lost race as a no-op.
    pub async fn create(&self, model: reaction::ActiveModel) -> AppResult<reaction::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Reaction already exists".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete a reaction by ID.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Reaction::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find a user's reaction with a specific emoji on a message.
    pub async fn find_by_message_user_emoji(
        &self,
        message_id: &str,
        user_id: &str,
        emoji: &str,
    ) -> AppResult<Option<reaction::Model>> {
        Reaction::find()
            .filter(reaction::Column::MessageId.eq(message_id))
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::Emoji.eq(emoji))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all reactions on a message.
    pub async fn find_by_message(&self, message_id: &str) -> AppResult<Vec<reaction::Model>> {
        Reaction::find()
            .filter(reaction::Column::MessageId.eq(message_id))
            .order_by_asc(reaction::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get reactions for a set of messages in one round trip.
    pub async fn find_by_message_ids(
        &self,
        message_ids: &[String],
    ) -> AppResult<Vec<reaction::Model>> {
        if message_ids.is_empty() {
            return Ok(vec![]);
        }

        Reaction::find()
            .filter(reaction::Column::MessageId.is_in(message_ids.to_vec()))
            .order_by_asc(reaction::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
