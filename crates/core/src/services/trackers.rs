//! Presence and unread seams.
//!
//! Core services touch presence and unread state through these traits so
//! they never depend on Redis directly. The realtime crate supplies the
//! backed implementations; tests and offline tools use the no-ops.

use async_trait::async_trait;
use huddle_common::AppResult;
use std::sync::Arc;

/// Advisory unread counters per (channel, user).
#[async_trait]
pub trait UnreadLedger: Send + Sync {
    /// Bump the counter for every listed member except the actor.
    async fn increment(
        &self,
        channel_id: &str,
        exclude_user_id: &str,
        member_user_ids: &[String],
    ) -> AppResult<()>;

    /// Zero the counter and record the last-read message id.
    async fn mark_read(&self, channel_id: &str, user_id: &str, message_id: &str) -> AppResult<()>;
}

/// Liveness state per user, per channel.
#[async_trait]
pub trait PresenceTracker: Send + Sync {
    /// Record activity, refreshing the sliding TTL.
    async fn mark_active(&self, channel_id: Option<&str>, user_id: &str) -> AppResult<()>;
}

/// No-op unread ledger.
#[derive(Clone, Default)]
pub struct NoOpUnreadLedger;

#[async_trait]
impl UnreadLedger for NoOpUnreadLedger {
    async fn increment(
        &self,
        _channel_id: &str,
        _exclude_user_id: &str,
        _member_user_ids: &[String],
    ) -> AppResult<()> {
        Ok(())
    }

    async fn mark_read(
        &self,
        _channel_id: &str,
        _user_id: &str,
        _message_id: &str,
    ) -> AppResult<()> {
        Ok(())
    }
}

/// No-op presence tracker.
#[derive(Clone, Default)]
pub struct NoOpPresenceTracker;

#[async_trait]
impl PresenceTracker for NoOpPresenceTracker {
    async fn mark_active(&self, _channel_id: Option<&str>, _user_id: &str) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed unread ledger trait object.
pub type UnreadLedgerService = Arc<dyn UnreadLedger>;

/// Wrapper for boxed presence tracker trait object.
pub type PresenceTrackerService = Arc<dyn PresenceTracker>;
