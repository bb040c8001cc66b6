//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Setup test database:
//!   docker-compose -f docker-compose.test.yml up -d test-db
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `huddle_test`)
//!   `TEST_DB_PASSWORD` (default: `huddle_test`)
//!   `TEST_DB_NAME` (default: `huddle_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use huddle_db::cursor::MessageCursor;
use huddle_db::entities::{channel, message};
use huddle_db::repositories::{MessageQuery, MessageRepository, SortDirection};
use huddle_db::test_utils::{TestDatabase, TestDbConfig, TestRedisConfig};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveValue::Set, EntityTrait};

async fn seed_channel(db: &TestDatabase, channel_id: &str) {
    channel::Entity::insert(channel::ActiveModel {
        id: Set(channel_id.to_string()),
        name: Set("general".to_string()),
        created_by: Set("user1".to_string()),
        is_archived: Set(false),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    })
    .exec(db.connection())
    .await
    .expect("channel insert failed");
}

fn message_row(id: &str, channel_id: &str, at: DateTimeWithTimeZone) -> message::ActiveModel {
    message::ActiveModel {
        id: Set(id.to_string()),
        channel_id: Set(channel_id.to_string()),
        user_id: Set("user1".to_string()),
        content: Set(Some(format!("message {id}"))),
        parent_message_id: Set(None),
        is_edited: Set(false),
        is_deleted: Set(false),
        created_at: Set(at),
        updated_at: Set(at),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_cleanup() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let result = db.cleanup().await;
    assert!(result.is_ok(), "Cleanup failed: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_execute_query() {
    let db = TestDatabase::new().await.expect("Failed to connect");

    // Connection should be valid
    use sea_orm::ConnectionTrait;
    let result = db
        .connection()
        .execute(sea_orm::Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await;

    assert!(result.is_ok(), "Query failed: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_message_create_then_read_back() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    huddle_db::migrate(db.connection()).await.expect("Migrations failed");
    seed_channel(&db, "chan1").await;

    let repo = MessageRepository::new(db.arc_connection());
    let at: DateTimeWithTimeZone = Utc::now().into();

    let created = repo
        .create(message_row("m01", "chan1", at))
        .await
        .expect("Insert failed");
    assert_eq!(created.id, "m01");

    let fetched = repo.get_by_id("m01").await.expect("Fetch failed");
    assert_eq!(fetched.channel_id, "chan1");
    assert_eq!(fetched.content, Some("message m01".to_string()));
    assert!(!fetched.is_edited);
    assert!(!fetched.is_deleted);

    // It must also surface through the history query
    let page = repo
        .query(MessageQuery {
            channel_id: "chan1".to_string(),
            ..Default::default()
        })
        .await
        .expect("Query failed");
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, "m01");
    assert!(page.next_cursor.is_none());

    db.drop_database().await.expect("Drop failed");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_cursor_walk_is_stable_under_concurrent_inserts() {
    let db = TestDatabase::create_unique().await.expect("Failed to create database");
    huddle_db::migrate(db.connection()).await.expect("Migrations failed");
    seed_channel(&db, "chan1").await;

    let repo = MessageRepository::new(db.arc_connection());

    // Identical timestamps on purpose: ordering must fall back to the id
    // leg of the compound key.
    let at: DateTimeWithTimeZone = Utc::now().into();
    let ids: Vec<String> = (1..=7).map(|i| format!("m{i:02}")).collect();
    for id in &ids {
        repo.create(message_row(id, "chan1", at)).await.expect("Insert failed");
    }

    let mut seen: Vec<String> = Vec::new();
    let mut cursor = None;
    loop {
        let page = repo
            .query(MessageQuery {
                channel_id: "chan1".to_string(),
                limit: Some(3),
                cursor: cursor.take(),
                direction: SortDirection::Newest,
                ..Default::default()
            })
            .await
            .expect("Query failed");
        seen.extend(page.items.iter().map(|m| m.id.clone()));

        // A message arriving mid-walk must not shift the remaining pages
        if seen.len() == 3 {
            repo.create(message_row("m99", "chan1", Utc::now().into()))
                .await
                .expect("Insert failed");
        }

        match page.next_cursor {
            Some(token) => cursor = Some(MessageCursor::decode(&token).expect("Bad cursor")),
            None => break,
        }
    }

    // The mid-walk arrival sits before the walk's start position, so a
    // newest-first resume never revisits it
    assert!(!seen.contains(&"m99".to_string()));

    // Every seeded message exactly once
    assert_eq!(seen.len(), ids.len());
    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(sorted, ids);

    // Newest-first with equal timestamps descends by id
    let expected: Vec<String> = ids.iter().rev().cloned().collect();
    assert_eq!(seen, expected);

    db.drop_database().await.expect("Drop failed");
}

#[test]
fn test_config_from_env() {
    // Test that default config is valid
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_redis_config_from_env() {
    let config = TestRedisConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testuser"));
    assert!(url.contains("testdb"));
}

#[test]
fn test_postgres_url_format() {
    let config = TestDbConfig::default();
    let url = config.postgres_url();
    assert!(url.ends_with("/postgres"));
}
