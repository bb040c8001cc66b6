//! TTL-backed presence tracker.
//!
//! Presence lives in Redis sorted sets scored by last-activity unix time,
//! one per channel plus a global set, alongside a per-user online flag
//! with a matching TTL. Point lookups expire automatically through the
//! flag's TTL; the sorted sets are pruned by [`sweep_expired`] since range
//! readers would otherwise keep seeing stale members.
//!
//! [`sweep_expired`]: RedisPresenceTracker::sweep_expired

use std::sync::Arc;

use async_trait::async_trait;
use fred::clients::Client;
use fred::interfaces::{KeysInterface, SetsInterface, SortedSetsInterface};
use fred::types::Expiration;
use huddle_common::{AppError, AppResult};
use huddle_core::services::PresenceTracker;
use tracing::debug;

/// Default sliding TTL for presence entries, 30 minutes.
pub const DEFAULT_TTL_SECS: i64 = 1800;

/// Key naming.
mod keys {
    /// Sorted set of users active across any channel.
    pub const GLOBAL: &str = "presence:global";
    /// Set of channel ids with a presence sorted set, for the sweeper.
    pub const CHANNEL_INDEX: &str = "presence:channels";

    pub fn channel(channel_id: &str) -> String {
        format!("presence:channel:{channel_id}")
    }

    pub fn online(user_id: &str) -> String {
        format!("presence:online:{user_id}")
    }
}

/// Redis-backed presence tracker.
#[derive(Clone)]
pub struct RedisPresenceTracker {
    redis: Arc<Client>,
    ttl_secs: i64,
}

impl RedisPresenceTracker {
    /// Create a tracker with the default 30 minute TTL.
    #[must_use]
    pub const fn new(redis: Arc<Client>) -> Self {
        Self {
            redis,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    /// Create a tracker with a custom TTL.
    #[must_use]
    pub const fn with_ttl(redis: Arc<Client>, ttl_secs: i64) -> Self {
        Self { redis, ttl_secs }
    }

    /// The sliding TTL in seconds.
    #[must_use]
    pub const fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Record activity for a user, refreshing the sliding TTL. With a
    /// channel, the channel membership entry is refreshed too.
    pub async fn mark_active(&self, channel_id: Option<&str>, user_id: &str) -> AppResult<()> {
        let now = chrono::Utc::now().timestamp();

        let _: () = self
            .redis
            .zadd(keys::GLOBAL, None, None, false, false, (now as f64, user_id))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        if let Some(channel_id) = channel_id {
            let _: () = self
                .redis
                .zadd(
                    keys::channel(channel_id),
                    None,
                    None,
                    false,
                    false,
                    (now as f64, user_id),
                )
                .await
                .map_err(|e| AppError::Redis(e.to_string()))?;
            let _: () = self
                .redis
                .sadd(keys::CHANNEL_INDEX, channel_id)
                .await
                .map_err(|e| AppError::Redis(e.to_string()))?;
        }

        let _: () = self
            .redis
            .set(
                keys::online(user_id),
                "1",
                Some(Expiration::EX(self.ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        Ok(())
    }

    /// Explicitly drop a user's presence entry. With a channel, only the
    /// channel membership entry goes; without one, the global entry goes.
    /// The online flag is removed either way.
    pub async fn mark_inactive(&self, channel_id: Option<&str>, user_id: &str) -> AppResult<()> {
        if let Some(channel_id) = channel_id {
            let _: () = self
                .redis
                .zrem(keys::channel(channel_id), user_id)
                .await
                .map_err(|e| AppError::Redis(e.to_string()))?;
        } else {
            let _: () = self
                .redis
                .zrem(keys::GLOBAL, user_id)
                .await
                .map_err(|e| AppError::Redis(e.to_string()))?;
        }

        let _: () = self
            .redis
            .del(keys::online(user_id))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        Ok(())
    }

    /// Users active in a channel, or globally when `channel_id` is `None`,
    /// with their last-activity unix timestamps. Entries older than the
    /// TTL are filtered out even if the sweeper has not pruned them yet.
    pub async fn list_active(&self, channel_id: Option<&str>) -> AppResult<Vec<(String, i64)>> {
        let key = channel_id.map_or_else(|| keys::GLOBAL.to_string(), keys::channel);
        let cutoff = chrono::Utc::now().timestamp() - self.ttl_secs;

        let entries: Vec<(String, f64)> = self
            .redis
            .zrange(&key, 0, -1, None, false, None, true)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        Ok(entries
            .into_iter()
            .filter_map(|(user_id, score)| {
                let ts = score as i64;
                (ts >= cutoff).then_some((user_id, ts))
            })
            .collect())
    }

    /// Whether a user's online flag is still live.
    pub async fn is_online(&self, user_id: &str) -> AppResult<bool> {
        let count: i64 = self
            .redis
            .exists(keys::online(user_id))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(count > 0)
    }

    /// Remove entries whose last activity predates `cutoff` from the
    /// global set and every known channel set. Returns removed count.
    pub async fn sweep_expired(&self, cutoff: i64) -> AppResult<u64> {
        let mut removed: u64 = self
            .redis
            .zremrangebyscore(keys::GLOBAL, f64::NEG_INFINITY, cutoff as f64)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        let channel_ids: Vec<String> = self
            .redis
            .smembers(keys::CHANNEL_INDEX)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        for channel_id in channel_ids {
            let n: u64 = self
                .redis
                .zremrangebyscore(keys::channel(&channel_id), f64::NEG_INFINITY, cutoff as f64)
                .await
                .map_err(|e| AppError::Redis(e.to_string()))?;
            removed += n;
        }

        debug!(removed, "Swept expired presence entries");
        Ok(removed)
    }
}

#[async_trait]
impl PresenceTracker for RedisPresenceTracker {
    async fn mark_active(&self, channel_id: Option<&str>, user_id: &str) -> AppResult<()> {
        Self::mark_active(self, channel_id, user_id).await
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
        assert_eq!(keys::channel("chan1"), "presence:channel:chan1");
        assert_eq!(keys::online("user1"), "presence:online:user1");
        assert_eq!(keys::GLOBAL, "presence:global");
    }

    async fn test_client() -> Arc<Client> {
        let url = TestRedisConfig::default().redis_url();
        let config = fred::types::config::Config::from_url(&url).unwrap();
        let client = Client::new(config, None, None, None);
        client.init().await.expect("Failed to connect to Redis");
        Arc::new(client)
    }

    fn unique_id(prefix: &str) -> String {
        format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
    }

    /// Plant a channel entry with an explicit last-activity timestamp.
    async fn plant_entry(client: &Client, channel_id: &str, user_id: &str, ts: i64) {
        let _: () = client
            .zadd(
                keys::channel(channel_id),
                None,
                None,
                false,
                false,
                (ts as f64, user_id),
            )
            .await
            .unwrap();
        let _: () = client.sadd(keys::CHANNEL_INDEX, channel_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running Redis instance"]
    async fn test_mark_active_then_listed_and_online() {
        let client = test_client().await;
        let tracker = RedisPresenceTracker::new(client);
        let channel = unique_id("chan");
        let user = unique_id("user");

        tracker.mark_active(Some(&channel), &user).await.unwrap();

        let active = tracker.list_active(Some(&channel)).await.unwrap();
        assert!(active.iter().any(|(id, _)| id == &user));
        assert!(tracker.is_online(&user).await.unwrap());

        tracker.mark_inactive(Some(&channel), &user).await.unwrap();
        let active = tracker.list_active(Some(&channel)).await.unwrap();
        assert!(active.iter().all(|(id, _)| id != &user));
        assert!(!tracker.is_online(&user).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires running Redis instance"]
    async fn test_list_active_filters_entries_older_than_ttl() {
        let client = test_client().await;
        let tracker = RedisPresenceTracker::new(client.clone());
        let channel = unique_id("chan");
        let fresh = unique_id("fresh");
        let stale = unique_id("stale");

        tracker.mark_active(Some(&channel), &fresh).await.unwrap();
        let old = chrono::Utc::now().timestamp() - tracker.ttl_secs() - 60;
        plant_entry(&client, &channel, &stale, old).await;

        let active = tracker.list_active(Some(&channel)).await.unwrap();
        assert!(active.iter().any(|(id, _)| id == &fresh));
        assert!(active.iter().all(|(id, _)| id != &stale));
    }

    #[tokio::test]
    #[ignore = "requires running Redis instance"]
    async fn test_sweep_prunes_stale_members() {
        let client = test_client().await;
        let tracker = RedisPresenceTracker::new(client.clone());
        let channel = unique_id("chan");
        let stale = unique_id("stale");

        let old = chrono::Utc::now().timestamp() - tracker.ttl_secs() - 60;
        plant_entry(&client, &channel, &stale, old).await;

        let cutoff = chrono::Utc::now().timestamp() - tracker.ttl_secs();
        let removed = tracker.sweep_expired(cutoff).await.unwrap();
        assert!(removed >= 1);

        // The raw sorted set no longer holds the member at all
        let remaining: Vec<(String, f64)> = client
            .zrange(&keys::channel(&channel), 0, -1, None, false, None, true)
            .await
            .unwrap();
        assert!(remaining.iter().all(|(id, _)| id != &stale));
    }
}
