//! Unread counters.
//!
//! Advisory per-(channel, user) badge counts plus a last-read marker.
//! Counters are eventually consistent and never a source of truth for
//! message state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fred::clients::Client;
use fred::interfaces::KeysInterface;
use huddle_common::{AppError, AppResult};
use huddle_core::services::UnreadLedger;

/// Key naming.
mod keys {
    pub fn unread(channel_id: &str, user_id: &str) -> String {
        format!("unread:{channel_id}:{user_id}")
    }

    pub fn last_read(channel_id: &str, user_id: &str) -> String {
        format!("lastread:{channel_id}:{user_id}")
    }
}

/// Redis-backed unread ledger.
#[derive(Clone)]
pub struct RedisUnreadLedger {
    redis: Arc<Client>,
}

impl RedisUnreadLedger {
    /// Create a new unread ledger.
    #[must_use]
    pub const fn new(redis: Arc<Client>) -> Self {
        Self { redis }
    }

    /// Bump the counter for every listed member except the actor.
    pub async fn increment(
        &self,
        channel_id: &str,
        exclude_user_id: &str,
        member_user_ids: &[String],
    ) -> AppResult<()> {
        for user_id in member_user_ids {
            if user_id == exclude_user_id {
                continue;
            }
            let _: i64 = self
                .redis
                .incr(keys::unread(channel_id, user_id))
                .await
                .map_err(|e| AppError::Redis(e.to_string()))?;
        }
        Ok(())
    }

    /// Zero the counter and record the last-read message id.
    pub async fn mark_read(
        &self,
        channel_id: &str,
        user_id: &str,
        message_id: &str,
    ) -> AppResult<()> {
        let _: () = self
            .redis
            .del(keys::unread(channel_id, user_id))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        let _: () = self
            .redis
            .set(keys::last_read(channel_id, user_id), message_id, None, None, false)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(())
    }

    /// Point read of one counter. A missing key reads as zero.
    pub async fn get_count(&self, channel_id: &str, user_id: &str) -> AppResult<i64> {
        let count: Option<i64> = self
            .redis
            .get(keys::unread(channel_id, user_id))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(count.unwrap_or(0))
    }

    /// Batched read across channels in one MGET round trip. Missing keys
    /// read as zero.
    pub async fn get_counts(
        &self,
        user_id: &str,
        channel_ids: &[String],
    ) -> AppResult<HashMap<String, i64>> {
        if channel_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let redis_keys: Vec<String> = channel_ids
            .iter()
            .map(|channel_id| keys::unread(channel_id, user_id))
            .collect();

        let counts: Vec<Option<i64>> = self
            .redis
            .mget(redis_keys)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        Ok(channel_ids
            .iter()
            .zip(counts)
            .map(|(channel_id, count)| (channel_id.clone(), count.unwrap_or(0)))
            .collect())
    }

    /// The last-read message id, if any read receipt was recorded.
    pub async fn get_last_read(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> AppResult<Option<String>> {
        self.redis
            .get(keys::last_read(channel_id, user_id))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))
    }
}

#[async_trait]
impl UnreadLedger for RedisUnreadLedger {
    async fn increment(
        &self,
        channel_id: &str,
        exclude_user_id: &str,
        member_user_ids: &[String],
    ) -> AppResult<()> {
        Self::increment(self, channel_id, exclude_user_id, member_user_ids).await
    }

    async fn mark_read(&self, channel_id: &str, user_id: &str, message_id: &str) -> AppResult<()> {
        Self::mark_read(self, channel_id, user_id, message_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use fred::interfaces::ClientLike;
    use huddle_db::test_utils::TestRedisConfig;

    #[test]
    fn test_key_names() {
        assert_eq!(keys::unread("chan1", "user1"), "unread:chan1:user1");
        assert_eq!(keys::last_read("chan1", "user1"), "lastread:chan1:user1");
    }

    async fn test_ledger() -> RedisUnreadLedger {
        let url = TestRedisConfig::default().redis_url();
        let config = fred::types::config::Config::from_url(&url).unwrap();
        let client = Client::new(config, None, None, None);
        client.init().await.expect("Failed to connect to Redis");
        RedisUnreadLedger::new(Arc::new(client))
    }

    /// Channel id unique per test run so runs never see each other's keys.
    fn unique_channel() -> String {
        format!("chan-{}", uuid::Uuid::new_v4().simple())
    }

    #[tokio::test]
    #[ignore = "requires running Redis instance"]
    async fn test_increment_skips_the_actor() {
        let ledger = test_ledger().await;
        let channel = unique_channel();
        let members = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        ledger.increment(&channel, "a", &members).await.unwrap();
        ledger.increment(&channel, "a", &members).await.unwrap();

        assert_eq!(ledger.get_count(&channel, "a").await.unwrap(), 0);
        assert_eq!(ledger.get_count(&channel, "b").await.unwrap(), 2);
        assert_eq!(ledger.get_count(&channel, "c").await.unwrap(), 2);
    }

    #[tokio::test]
    #[ignore = "requires running Redis instance"]
    async fn test_mark_read_zeroes_only_the_reader() {
        let ledger = test_ledger().await;
        let channel = unique_channel();
        let members = vec!["a".to_string(), "b".to_string()];

        ledger.increment(&channel, "sender", &members).await.unwrap();
        ledger.mark_read(&channel, "b", "msg1").await.unwrap();

        assert_eq!(ledger.get_count(&channel, "b").await.unwrap(), 0);
        assert_eq!(ledger.get_count(&channel, "a").await.unwrap(), 1);
        assert_eq!(
            ledger.get_last_read(&channel, "b").await.unwrap(),
            Some("msg1".to_string())
        );
        assert_eq!(ledger.get_last_read(&channel, "a").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires running Redis instance"]
    async fn test_get_counts_reads_missing_channels_as_zero() {
        let ledger = test_ledger().await;
        let with_unread = unique_channel();
        let untouched = unique_channel();
        let members = vec!["b".to_string()];

        ledger.increment(&with_unread, "sender", &members).await.unwrap();

        let counts = ledger
            .get_counts("b", &[with_unread.clone(), untouched.clone()])
            .await
            .unwrap();
        assert_eq!(counts.get(&with_unread), Some(&1));
        assert_eq!(counts.get(&untouched), Some(&0));
    }
}
