//! Message repository.

use std::sync::Arc;

use crate::cursor::MessageCursor;
use crate::entities::{Message, message};
use huddle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Hard cap on page size. Requests above this are clamped, not rejected.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Scan direction through a channel's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Newest first (descending `(created_at, id)`).
    #[default]
    Newest,
    /// Oldest first (ascending `(created_at, id)`).
    Oldest,
}

/// Thread filter for history queries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParentFilter {
    /// Only top-level messages (no parent).
    #[default]
    TopLevel,
    /// Only replies to the given message.
    Replies(String),
    /// Top-level messages and replies alike.
    Any,
}

/// Parameters for a channel history query.
#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    pub channel_id: String,
    /// Requested page size. Clamped to `1..=MAX_PAGE_SIZE`, defaults to
    /// `DEFAULT_PAGE_SIZE`.
    pub limit: Option<u64>,
    /// Resume position from a previous page.
    pub cursor: Option<MessageCursor>,
    pub direction: SortDirection,
    pub parent: ParentFilter,
    /// Include soft-deleted rows. Off by default.
    pub include_deleted: bool,
}

/// One page of history plus the token to fetch the next one.
#[derive(Debug, Clone)]
pub struct MessagePage {
    pub items: Vec<message::Model>,
    /// `None` when this page exhausted the stream.
    pub next_cursor: Option<String>,
}

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a message by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<message::Model>> {
        Message::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a message by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<message::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::MessageNotFound(id.to_string()))
    }

    /// Find messages by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<message::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Message::find()
            .filter(message::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new message.
    pub async fn create(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace a message's content, marking it as edited and bumping
    /// `updated_at`.
    pub async fn update_content(
        &self,
        model: message::Model,
        content: String,
    ) -> AppResult<message::Model> {
        let mut active: message::ActiveModel = model.into();
        active.content = Set(Some(content));
        active.is_edited = Set(true);
        active.updated_at = Set(chrono::Utc::now().into());

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Soft-delete a message. Idempotent: deleting an already deleted
    /// message is a no-op.
    pub async fn soft_delete(&self, id: &str) -> AppResult<()> {
        Message::update_many()
            .col_expr(message::Column::IsDeleted, Expr::value(true))
            .col_expr(
                message::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(
                    chrono::Utc::now(),
                )),
            )
            .filter(message::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Paginate a channel's history.
    ///
    /// Results are totally ordered by the compound `(created_at, id)` key so
    /// that same-timestamp messages page deterministically. The page is
    /// overfetched by one row to decide whether a `next_cursor` exists.
    pub async fn query(&self, params: MessageQuery) -> AppResult<MessagePage> {
        let limit = params
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let mut condition =
            Condition::all().add(message::Column::ChannelId.eq(params.channel_id.as_str()));

        if !params.include_deleted {
            condition = condition.add(message::Column::IsDeleted.eq(false));
        }

        condition = match &params.parent {
            ParentFilter::TopLevel => {
                condition.add(message::Column::ParentMessageId.is_null())
            }
            ParentFilter::Replies(parent_id) => {
                condition.add(message::Column::ParentMessageId.eq(parent_id.as_str()))
            }
            ParentFilter::Any => condition,
        };

        if let Some(cursor) = &params.cursor {
            // Strictly past the cursor position in the compound order
            let after = match params.direction {
                SortDirection::Newest => Condition::any()
                    .add(message::Column::CreatedAt.lt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(message::Column::CreatedAt.eq(cursor.created_at))
                            .add(message::Column::Id.lt(cursor.id.as_str())),
                    ),
                SortDirection::Oldest => Condition::any()
                    .add(message::Column::CreatedAt.gt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(message::Column::CreatedAt.eq(cursor.created_at))
                            .add(message::Column::Id.gt(cursor.id.as_str())),
                    ),
            };
            condition = condition.add(after);
        }

        let query = Message::find().filter(condition);
        let query = match params.direction {
            SortDirection::Newest => query
                .order_by_desc(message::Column::CreatedAt)
                .order_by_desc(message::Column::Id),
            SortDirection::Oldest => query
                .order_by_asc(message::Column::CreatedAt)
                .order_by_asc(message::Column::Id),
        };

        let mut items = query
            .limit(limit + 1)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let has_more = items.len() as u64 > limit;
        if has_more {
            items.truncate(limit as usize);
        }

        let next_cursor = if has_more {
            items.last().map(|last| {
                MessageCursor {
                    id: last.id.clone(),
                    created_at: last.created_at,
                }
                .encode()
            })
        } else {
            None
        };

        Ok(MessagePage { items, next_cursor })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_message(id: &str, channel_id: &str, content: &str) -> message::Model {
        message::Model {
            id: id.to_string(),
            channel_id: channel_id.to_string(),
            user_id: "user1".to_string(),
            content: Some(content.to_string()),
            parent_message_id: None,
            is_edited: false,
            is_deleted: false,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let msg = create_test_message("msg1", "chan1", "Hello world");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[msg.clone()]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let result = repo.find_by_id("msg1").await.unwrap();

        assert!(result.is_some());
        let found = result.unwrap();
        assert_eq!(found.id, "msg1");
        assert_eq!(found.content, Some("Hello world".to_string()));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<message::Model>::new()])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let result = repo.get_by_id("nonexistent").await;

        assert!(result.is_err());
        match result {
            Err(AppError::MessageNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected MessageNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = MessageRepository::new(db);
        let result = repo.find_by_ids(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_query_full_page_yields_next_cursor() {
        // limit 2, three rows returned: page has more
        let m1 = create_test_message("msg3", "chan1", "third");
        let m2 = create_test_message("msg2", "chan1", "second");
        let m3 = create_test_message("msg1", "chan1", "first");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[m1, m2.clone(), m3]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let page = repo
            .query(MessageQuery {
                channel_id: "chan1".to_string(),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        let token = page.next_cursor.expect("expected a next cursor");
        let cursor = MessageCursor::decode(&token).unwrap();
        assert_eq!(cursor.id, m2.id);
        assert_eq!(cursor.created_at, m2.created_at);
    }

    #[tokio::test]
    async fn test_query_short_page_has_no_cursor() {
        let m1 = create_test_message("msg2", "chan1", "second");
        let m2 = create_test_message("msg1", "chan1", "first");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[m1, m2]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let page = repo
            .query(MessageQuery {
                channel_id: "chan1".to_string(),
                limit: Some(50),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_query_exact_limit_has_no_cursor() {
        // Exactly `limit` rows in the store: the overfetch row is absent,
        // so the stream is exhausted.
        let m1 = create_test_message("msg2", "chan1", "second");
        let m2 = create_test_message("msg1", "chan1", "first");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[m1, m2]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let page = repo
            .query(MessageQuery {
                channel_id: "chan1".to_string(),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_update_content_marks_edited() {
        let original = create_test_message("msg1", "chan1", "before");
        let mut updated = original.clone();
        updated.content = Some("after".to_string());
        updated.is_edited = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[updated]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let result = repo
            .update_content(original, "after".to_string())
            .await
            .unwrap();

        assert_eq!(result.content, Some("after".to_string()));
        assert!(result.is_edited);
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        repo.soft_delete("msg1").await.unwrap();
    }

    #[tokio::test]
    async fn test_soft_delete_idempotent() {
        // Already-deleted row: zero rows affected is still success
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        repo.soft_delete("msg1").await.unwrap();
    }
}
