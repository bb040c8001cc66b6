//! Channel and membership repository.

use std::sync::Arc;

use crate::entities::{Channel, ChannelMember, channel, channel_member};
use huddle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

/// Channel repository for database operations.
///
/// Membership rows live here too; every authorization decision starts from
/// a `(channel, user)` lookup.
#[derive(Clone)]
pub struct ChannelRepository {
    db: Arc<DatabaseConnection>,
}

impl ChannelRepository {
    /// Create a new channel repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a channel by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<channel::Model>> {
        Channel::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a channel by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<channel::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ChannelNotFound(id.to_string()))
    }

    /// Create a new channel.
    pub async fn create(&self, model: channel::ActiveModel) -> AppResult<channel::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Membership ====================

    /// Find a membership row for a user in a channel.
    pub async fn find_member(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> AppResult<Option<channel_member::Model>> {
        ChannelMember::find()
            .filter(channel_member::Column::ChannelId.eq(channel_id))
            .filter(channel_member::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a user belongs to a channel.
    pub async fn is_member(&self, channel_id: &str, user_id: &str) -> AppResult<bool> {
        let count = ChannelMember::find()
            .filter(channel_member::Column::ChannelId.eq(channel_id))
            .filter(channel_member::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Add a member to a channel.
    pub async fn add_member(
        &self,
        model: channel_member::ActiveModel,
    ) -> AppResult<channel_member::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All user IDs belonging to a channel.
    pub async fn member_user_ids(&self, channel_id: &str) -> AppResult<Vec<String>> {
        let members = ChannelMember::find()
            .filter(channel_member::Column::ChannelId.eq(channel_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(members.into_iter().map(|m| m.user_id).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::channel_member::ChannelRole;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_channel(id: &str, name: &str) -> channel::Model {
        channel::Model {
            id: id.to_string(),
            name: name.to_string(),
            created_by: "user1".to_string(),
            is_archived: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_member(id: &str, channel_id: &str, user_id: &str, role: ChannelRole) -> channel_member::Model {
        channel_member::Model {
            id: id.to_string(),
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            role,
            can_manage_messages: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<channel::Model>::new()])
                .into_connection(),
        );

        let repo = ChannelRepository::new(db);
        let result = repo.get_by_id("nonexistent").await;

        assert!(result.is_err());
        match result {
            Err(AppError::ChannelNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected ChannelNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let chan = create_test_channel("chan1", "general");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[chan]])
                .into_connection(),
        );

        let repo = ChannelRepository::new(db);
        let result = repo.find_by_id("chan1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().name, "general");
    }

    #[tokio::test]
    async fn test_find_member_found() {
        let member = create_test_member("cm1", "chan1", "user1", ChannelRole::Moderator);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member]])
                .into_connection(),
        );

        let repo = ChannelRepository::new(db);
        let result = repo.find_member("chan1", "user1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().role, ChannelRole::Moderator);
    }

    #[tokio::test]
    async fn test_member_user_ids() {
        let m1 = create_test_member("cm1", "chan1", "user1", ChannelRole::Owner);
        let m2 = create_test_member("cm2", "chan1", "user2", ChannelRole::Member);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[m1, m2]])
                .into_connection(),
        );

        let repo = ChannelRepository::new(db);
        let result = repo.member_user_ids("chan1").await.unwrap();

        assert_eq!(result, vec!["user1".to_string(), "user2".to_string()]);
    }
}
