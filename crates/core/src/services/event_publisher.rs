//! Event publisher service.
//!
//! Provides an abstraction for publishing real-time events.
//! The actual implementation is provided by the realtime crate (Redis Pub/Sub).

use async_trait::async_trait;
use huddle_common::AppResult;
use huddle_db::entities::{attachment, message, reaction};
use std::sync::Arc;

/// Trait for publishing real-time chat events.
///
/// This allows the core services to publish events
/// without directly depending on the pub/sub implementation.
///
/// Delivery is at-most-once and best-effort. Callers log and swallow
/// failures because the mutation has already been persisted by the time
/// an event is published.
#[async_trait]
pub trait ChatEventPublisher: Send + Sync {
    /// Publish a message created event to the channel room.
    async fn publish_message_created(
        &self,
        message: &message::Model,
        attachments: &[attachment::Model],
    ) -> AppResult<()>;

    /// Publish a message updated event to the channel room.
    async fn publish_message_updated(&self, message: &message::Model) -> AppResult<()>;

    /// Publish a message deleted event to the channel room.
    ///
    /// Content is intentionally omitted from the payload.
    async fn publish_message_deleted(&self, message_id: &str, channel_id: &str) -> AppResult<()>;

    /// Publish a reaction toggled event to the channel room.
    ///
    /// `added` carries the reaction row for the add branch; the remove
    /// branch passes the deleted row so consumers can resolve who removed
    /// which emoji.
    async fn publish_reaction_toggled(
        &self,
        message_id: &str,
        channel_id: &str,
        action: &str,
        reaction: &reaction::Model,
    ) -> AppResult<()>;
}

/// A no-op implementation for testing or when real-time events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl ChatEventPublisher for NoOpEventPublisher {
    async fn publish_message_created(
        &self,
        _message: &message::Model,
        _attachments: &[attachment::Model],
    ) -> AppResult<()> {
        Ok(())
    }

    async fn publish_message_updated(&self, _message: &message::Model) -> AppResult<()> {
        Ok(())
    }

    async fn publish_message_deleted(
        &self,
        _message_id: &str,
        _channel_id: &str,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn publish_reaction_toggled(
        &self,
        _message_id: &str,
        _channel_id: &str,
        _action: &str,
        _reaction: &reaction::Model,
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed publisher trait object.
pub type EventPublisherService = Arc<dyn ChatEventPublisher>;
