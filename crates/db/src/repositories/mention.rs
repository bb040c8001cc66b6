//! Mention repository.

use std::sync::Arc;

use crate::entities::{Mention, mention};
use huddle_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Mention repository for database operations.
#[derive(Clone)]
pub struct MentionRepository {
    db: Arc<DatabaseConnection>,
}

impl MentionRepository {
    /// Create a new mention repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a batch of mention rows.
    pub async fn create_many(&self, models: Vec<mention::ActiveModel>) -> AppResult<()> {
        if models.is_empty() {
            return Ok(());
        }

        Mention::insert_many(models)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get mentions recorded for a message.
    pub async fn find_by_message(&self, message_id: &str) -> AppResult<Vec<mention::Model>> {
        Mention::find()
            .filter(mention::Column::MessageId.eq(message_id))
            .order_by_asc(mention::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_mention(id: &str, message_id: &str, user_id: &str) -> mention::Model {
        mention::Model {
            id: id.to_string(),
            message_id: message_id.to_string(),
            mentioned_user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_many_empty_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = MentionRepository::new(db);
        repo.create_many(vec![]).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_many() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = MentionRepository::new(db);
        let models = vec![
            mention::ActiveModel {
                id: sea_orm::ActiveValue::Set("m1".to_string()),
                message_id: sea_orm::ActiveValue::Set("msg1".to_string()),
                mentioned_user_id: sea_orm::ActiveValue::Set("user1".to_string()),
                created_at: sea_orm::ActiveValue::Set(Utc::now().into()),
            },
            mention::ActiveModel {
                id: sea_orm::ActiveValue::Set("m2".to_string()),
                message_id: sea_orm::ActiveValue::Set("msg1".to_string()),
                mentioned_user_id: sea_orm::ActiveValue::Set("user2".to_string()),
                created_at: sea_orm::ActiveValue::Set(Utc::now().into()),
            },
        ];
        repo.create_many(models).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_by_message() {
        let m1 = create_test_mention("m1", "msg1", "user1");
        let m2 = create_test_mention("m2", "msg1", "user2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[m1, m2]])
                .into_connection(),
        );

        let repo = MentionRepository::new(db);
        let result = repo.find_by_message("msg1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].mentioned_user_id, "user1");
    }
}
