//! Redis Pub/Sub for room-addressed event fan-out.
//!
//! Events are published to one Redis channel per room so they reach every
//! server instance. Delivery is at-most-once and best-effort: there are no
//! retries and no confirmation, a disconnected client reconciles through
//! the paginated history query on reconnect.

#![allow(missing_docs)]

use async_trait::async_trait;
use fred::clients::{Client, SubscriberClient};
use fred::error::{Error as RedisError, ErrorKind as RedisErrorKind};
use fred::interfaces::{ClientLike, EventInterface, PubsubInterface};
use fred::types::config::Config as RedisConfig;
use huddle_common::AppResult;
use huddle_core::services::ChatEventPublisher;
use huddle_db::entities::{attachment, message, reaction};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Room naming.
pub mod rooms {
    /// Channel room prefix (suffix with channel ID).
    pub const CHANNEL_PREFIX: &str = "huddle:channel:";
    /// Personal room prefix (suffix with user ID).
    pub const USER_PREFIX: &str = "huddle:user:";

    /// Room shared by every session that joined a channel.
    #[must_use]
    pub fn channel(channel_id: &str) -> String {
        format!("{CHANNEL_PREFIX}{channel_id}")
    }

    /// A user's personal room, for out-of-channel signals.
    #[must_use]
    pub fn user(user_id: &str) -> String {
        format!("{USER_PREFIX}{user_id}")
    }
}

/// Pub/Sub event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatEvent {
    /// New message created.
    MessageCreated {
        message: message::Model,
        attachments: Vec<attachment::Model>,
    },
    /// Message content edited.
    MessageUpdated { message: message::Model },
    /// Message soft-deleted. Content is intentionally omitted.
    MessageDeleted { id: String, channel_id: String },
    /// Reaction added or removed.
    ReactionToggled {
        message_id: String,
        channel_id: String,
        action: String,
        reaction: reaction::Model,
    },
}

/// An event paired with the room it was addressed to.
#[derive(Debug, Clone)]
pub struct RoomMessage {
    pub room: String,
    pub event: ChatEvent,
}

/// Redis Pub/Sub manager for event distribution.
#[derive(Clone)]
pub struct RedisPubSub {
    publisher: Client,
    subscriber: SubscriberClient,
    /// Local broadcast channel for events received from Redis.
    local_tx: broadcast::Sender<RoomMessage>,
}

impl RedisPubSub {
    /// Create a new Redis Pub/Sub manager.
    pub async fn new(redis_url: &str) -> Result<Self, RedisError> {
        let config = RedisConfig::from_url(redis_url)?;

        let publisher = Client::new(config.clone(), None, None, None);
        publisher.init().await?;

        let subscriber = SubscriberClient::new(config, None, None, None);
        subscriber.init().await?;

        let (local_tx, _) = broadcast::channel(1000);

        info!("Redis Pub/Sub initialized");

        Ok(Self {
            publisher,
            subscriber,
            local_tx,
        })
    }

    /// Start the event loop forwarding Redis messages to local sessions.
    pub fn start(&self) {
        let local_tx = self.local_tx.clone();
        let mut message_stream = self.subscriber.message_rx();

        tokio::spawn(async move {
            while let Ok(message) = message_stream.recv().await {
                let room = message.channel.to_string();
                if let Some(payload) = message.value.as_string() {
                    match serde_json::from_str::<ChatEvent>(&payload) {
                        Ok(event) => {
                            debug!(room, ?event, "Received Pub/Sub event");
                            if local_tx.send(RoomMessage { room, event }).is_err() {
                                debug!("No local subscribers for Pub/Sub event");
                            }
                        }
                        Err(e) => {
                            warn!("Failed to parse Pub/Sub message: {}", e);
                        }
                    }
                }
            }
            info!("Pub/Sub message stream ended");
        });
    }

    /// Subscribe this instance to a room.
    pub async fn subscribe_room(&self, room: &str) -> Result<(), RedisError> {
        self.subscriber.subscribe(room).await?;
        debug!(room, "Subscribed to room");
        Ok(())
    }

    /// Unsubscribe this instance from a room.
    pub async fn unsubscribe_room(&self, room: &str) -> Result<(), RedisError> {
        self.subscriber.unsubscribe(room).await?;
        debug!(room, "Unsubscribed from room");
        Ok(())
    }

    /// Publish an event to a room.
    pub async fn publish(&self, room: &str, event: &ChatEvent) -> Result<(), RedisError> {
        let payload = serde_json::to_string(event).map_err(|e| {
            RedisError::new(
                RedisErrorKind::InvalidArgument,
                format!("Serialization error: {e}"),
            )
        })?;
        let _: () = self.publisher.publish(room, payload).await?;
        debug!(room, ?event, "Published Pub/Sub event");
        Ok(())
    }

    /// Get a receiver for local broadcast events.
    #[must_use]
    pub fn subscribe_local(&self) -> broadcast::Receiver<RoomMessage> {
        self.local_tx.subscribe()
    }

    /// Get the number of local subscribers.
    #[must_use]
    pub fn local_subscriber_count(&self) -> usize {
        self.local_tx.receiver_count()
    }

    /// Shutdown the Pub/Sub manager.
    pub async fn shutdown(&self) -> Result<(), RedisError> {
        self.subscriber.quit().await?;
        self.publisher.quit().await?;
        info!("Redis Pub/Sub shutdown");
        Ok(())
    }
}

/// Implementation of the core publisher seam for `RedisPubSub`.
#[async_trait]
impl ChatEventPublisher for RedisPubSub {
    async fn publish_message_created(
        &self,
        message: &message::Model,
        attachments: &[attachment::Model],
    ) -> AppResult<()> {
        let event = ChatEvent::MessageCreated {
            message: message.clone(),
            attachments: attachments.to_vec(),
        };
        self.publish(&rooms::channel(&message.channel_id), &event)
            .await
            .map_err(|e| huddle_common::AppError::Redis(e.to_string()))
    }

    async fn publish_message_updated(&self, message: &message::Model) -> AppResult<()> {
        let event = ChatEvent::MessageUpdated {
            message: message.clone(),
        };
        self.publish(&rooms::channel(&message.channel_id), &event)
            .await
            .map_err(|e| huddle_common::AppError::Redis(e.to_string()))
    }

    async fn publish_message_deleted(&self, message_id: &str, channel_id: &str) -> AppResult<()> {
        let event = ChatEvent::MessageDeleted {
            id: message_id.to_string(),
            channel_id: channel_id.to_string(),
        };
        self.publish(&rooms::channel(channel_id), &event)
            .await
            .map_err(|e| huddle_common::AppError::Redis(e.to_string()))
    }

    async fn publish_reaction_toggled(
        &self,
        message_id: &str,
        channel_id: &str,
        action: &str,
        reaction: &reaction::Model,
    ) -> AppResult<()> {
        let event = ChatEvent::ReactionToggled {
            message_id: message_id.to_string(),
            channel_id: channel_id.to_string(),
            action: action.to_string(),
            reaction: reaction.clone(),
        };
        self.publish(&rooms::channel(channel_id), &event)
            .await
            .map_err(|e| huddle_common::AppError::Redis(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_room_names() {
        assert_eq!(rooms::channel("chan1"), "huddle:channel:chan1");
        assert_eq!(rooms::user("user1"), "huddle:user:user1");
    }

    #[test]
    fn test_message_created_serialization() {
        let message = message::Model {
            id: "msg1".to_string(),
            channel_id: "chan1".to_string(),
            user_id: "user1".to_string(),
            content: Some("Hello".to_string()),
            parent_message_id: None,
            is_edited: false,
            is_deleted: false,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };

        let event = ChatEvent::MessageCreated {
            message,
            attachments: vec![],
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"messageCreated\""));
        assert!(json.contains("\"id\":\"msg1\""));

        let parsed: ChatEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, ChatEvent::MessageCreated { .. }));
    }

    #[test]
    fn test_message_deleted_omits_content() {
        let event = ChatEvent::MessageDeleted {
            id: "msg1".to_string(),
            channel_id: "chan1".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"messageDeleted\""));
        assert!(!json.contains("content"));
    }

    #[test]
    fn test_reaction_toggled_serialization() {
        let reaction = reaction::Model {
            id: "r1".to_string(),
            message_id: "msg1".to_string(),
            user_id: "user1".to_string(),
            emoji: "👍".to_string(),
            created_at: Utc::now().into(),
        };

        let event = ChatEvent::ReactionToggled {
            message_id: "msg1".to_string(),
            channel_id: "chan1".to_string(),
            action: "remove".to_string(),
            reaction,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"reactionToggled\""));
        assert!(json.contains("\"action\":\"remove\""));
        // Remove events still name the emoji and user
        assert!(json.contains("\"emoji\":\"👍\""));

        let parsed: ChatEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, ChatEvent::ReactionToggled { .. }));
    }
}
