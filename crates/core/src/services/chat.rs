//! Chat service.
//!
//! The use-case layer for channel messaging: sending, listing, editing,
//! deleting messages and toggling reactions. Composes the repositories,
//! the permission service, and the realtime seams (events, presence,
//! unread counters).
//!
//! Persistence is the commit point for every mutation. Events, presence
//! refreshes and unread bumps happen after the rows are written and are
//! logged and swallowed on failure, so a client receiving an event can
//! always fetch the referenced row by id.

use std::collections::HashMap;

use crate::services::event_publisher::EventPublisherService;
use crate::services::permission::PermissionService;
use crate::services::trackers::{PresenceTrackerService, UnreadLedgerService};
use huddle_common::{AppError, AppResult, IdGenerator};
use huddle_db::entities::{attachment, mention, message, reaction};
use huddle_db::repositories::{
    AttachmentRepository, ChannelRepository, MentionRepository, MessagePage, MessageQuery,
    MessageRepository, ReactionRepository,
};
use sea_orm::Set;

/// Upper bound on message content length, in characters.
pub const MAX_CONTENT_LENGTH: usize = 4000;

/// Attachment metadata supplied with a send request.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub file_name: String,
    pub file_type: String,
    pub size: i64,
    pub blob_location: String,
}

/// Input for the send-message use case.
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub user_id: String,
    pub channel_id: String,
    /// May be `None` for attachment-only messages.
    pub content: Option<String>,
    pub parent_message_id: Option<String>,
    pub attachments: Vec<NewAttachment>,
    /// Ids of pre-uploaded, unbound attachment rows to bind to this message.
    pub attachment_ids: Vec<String>,
}

/// Result of the send-message use case.
#[derive(Debug, Clone)]
pub struct SendMessageResult {
    pub message: message::Model,
    pub attachments: Vec<attachment::Model>,
}

/// Result of the get-channel-messages use case.
///
/// Every message id in `messages` has a key in both maps, empty when the
/// message has no attachments or reactions. Callers must not distinguish
/// "no entries" from "key absent".
#[derive(Debug, Clone)]
pub struct GetChannelMessagesResult {
    pub messages: Vec<message::Model>,
    pub next_cursor: Option<String>,
    pub attachments: HashMap<String, Vec<attachment::Model>>,
    pub reactions: HashMap<String, Vec<reaction::Model>>,
}

/// Which way a reaction toggle went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Add,
    Remove,
}

impl ToggleAction {
    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

/// Result of the toggle-reaction use case. `reaction` is `None` on remove.
#[derive(Debug, Clone)]
pub struct ToggleReactionResult {
    pub action: ToggleAction,
    pub reaction: Option<reaction::Model>,
}

/// Chat service for business logic.
#[derive(Clone)]
pub struct ChatService {
    message_repo: MessageRepository,
    attachment_repo: AttachmentRepository,
    reaction_repo: ReactionRepository,
    mention_repo: MentionRepository,
    channel_repo: ChannelRepository,
    permissions: PermissionService,
    event_publisher: Option<EventPublisherService>,
    unread: Option<UnreadLedgerService>,
    presence: Option<PresenceTrackerService>,
    id_gen: IdGenerator,
}

impl ChatService {
    /// Create a new chat service.
    #[must_use]
    pub fn new(
        message_repo: MessageRepository,
        attachment_repo: AttachmentRepository,
        reaction_repo: ReactionRepository,
        mention_repo: MentionRepository,
        channel_repo: ChannelRepository,
    ) -> Self {
        let permissions = PermissionService::new(channel_repo.clone());
        Self {
            message_repo,
            attachment_repo,
            reaction_repo,
            mention_repo,
            channel_repo,
            permissions,
            event_publisher: None,
            unread: None,
            presence: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Set the unread ledger.
    pub fn set_unread_ledger(&mut self, unread: UnreadLedgerService) {
        self.unread = Some(unread);
    }

    /// Set the presence tracker.
    pub fn set_presence_tracker(&mut self, presence: PresenceTrackerService) {
        self.presence = Some(presence);
    }

    /// Send a message to a channel.
    ///
    /// Membership alone gates sending; no permission bit is involved.
    /// Rows are written in order message, attachments, mentions, and the
    /// created event fires only after all three.
    pub async fn send_message(&self, input: SendMessageInput) -> AppResult<SendMessageResult> {
        Self::validate_send(&input)?;

        self.permissions
            .require_membership(&input.channel_id, &input.user_id)
            .await?;

        if let Some(parent_id) = &input.parent_message_id {
            let parent = self.message_repo.get_by_id(parent_id).await?;
            if parent.channel_id != input.channel_id {
                return Err(AppError::Validation(
                    "Parent message belongs to another channel".to_string(),
                ));
            }
        }

        // Validate pre-uploaded attachments before any row is written
        let preuploaded = self.load_unbound_attachments(&input.attachment_ids).await?;

        let now = chrono::Utc::now();
        let message = self
            .message_repo
            .create(message::ActiveModel {
                id: Set(self.id_gen.generate()),
                channel_id: Set(input.channel_id.clone()),
                user_id: Set(input.user_id.clone()),
                content: Set(input.content.clone()),
                parent_message_id: Set(input.parent_message_id.clone()),
                is_edited: Set(false),
                is_deleted: Set(false),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            })
            .await?;

        let mut attachments = self.create_attachments(&message, &input.attachments).await?;
        attachments.extend(self.bind_attachments(&message, preuploaded).await?);

        if let Some(content) = &input.content {
            self.create_mentions(&message.id, content).await?;
        }

        self.touch_presence(Some(&input.channel_id), &input.user_id)
            .await;

        if let Some(ref unread) = self.unread {
            match self.channel_repo.member_user_ids(&input.channel_id).await {
                Ok(member_ids) => {
                    if let Err(e) = unread
                        .increment(&input.channel_id, &input.user_id, &member_ids)
                        .await
                    {
                        tracing::warn!(error = %e, "Failed to bump unread counters");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to list channel members for unread bump");
                }
            }
        }

        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher
                .publish_message_created(&message, &attachments)
                .await
            {
                tracing::warn!(error = %e, "Failed to publish message created event");
            }
        }

        Ok(SendMessageResult {
            message,
            attachments,
        })
    }

    /// List a channel's messages with cursor pagination.
    pub async fn get_channel_messages(
        &self,
        user_id: &str,
        query: MessageQuery,
    ) -> AppResult<GetChannelMessagesResult> {
        self.permissions
            .require_membership(&query.channel_id, user_id)
            .await?;

        let channel_id = query.channel_id.clone();
        let MessagePage { items, next_cursor } = self.message_repo.query(query).await?;

        let message_ids: Vec<String> = items.iter().map(|m| m.id.clone()).collect();

        // Every id gets a key up front so empty sets are explicit
        let mut attachments: HashMap<String, Vec<attachment::Model>> = message_ids
            .iter()
            .map(|id| (id.clone(), Vec::new()))
            .collect();
        let mut reactions: HashMap<String, Vec<reaction::Model>> = message_ids
            .iter()
            .map(|id| (id.clone(), Vec::new()))
            .collect();

        for a in self.attachment_repo.find_by_message_ids(&message_ids).await? {
            if let Some(message_id) = &a.message_id {
                if let Some(bucket) = attachments.get_mut(message_id) {
                    bucket.push(a);
                }
            }
        }

        for r in self.reaction_repo.find_by_message_ids(&message_ids).await? {
            if let Some(bucket) = reactions.get_mut(&r.message_id) {
                bucket.push(r);
            }
        }

        self.touch_presence(Some(&channel_id), user_id).await;

        Ok(GetChannelMessagesResult {
            messages: items,
            next_cursor,
            attachments,
            reactions,
        })
    }

    /// Edit a message's content. Author-only; no role override.
    pub async fn update_message(
        &self,
        user_id: &str,
        message_id: &str,
        content: String,
    ) -> AppResult<message::Model> {
        if content.is_empty() || content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(AppError::Validation("Invalid message content".to_string()));
        }

        let message = self.message_repo.get_by_id(message_id).await?;

        if message.user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can edit a message".to_string(),
            ));
        }
        if message.is_deleted {
            return Err(AppError::Validation(
                "Cannot edit deleted message".to_string(),
            ));
        }

        let updated = self.message_repo.update_content(message, content).await?;

        self.touch_presence(Some(&updated.channel_id), user_id).await;

        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher.publish_message_updated(&updated).await {
                tracing::warn!(error = %e, "Failed to publish message updated event");
            }
        }

        Ok(updated)
    }

    /// Soft-delete a message.
    ///
    /// Allowed for the author, a channel owner, or a moderator holding the
    /// `manage_messages` bit.
    pub async fn delete_message(&self, user_id: &str, message_id: &str) -> AppResult<()> {
        let message = self.message_repo.get_by_id(message_id).await?;

        let membership = self
            .permissions
            .get_membership(&message.channel_id, user_id)
            .await?;
        let allowed = message.user_id == user_id
            || membership.is_some_and(|m| m.can_delete_message(&message.user_id, user_id));
        if !allowed {
            return Err(AppError::Forbidden(
                "Not allowed to delete this message".to_string(),
            ));
        }

        self.message_repo.soft_delete(message_id).await?;

        self.touch_presence(Some(&message.channel_id), user_id).await;

        if let Some(ref event_publisher) = self.event_publisher {
            // Content is intentionally omitted from the payload
            if let Err(e) = event_publisher
                .publish_message_deleted(message_id, &message.channel_id)
                .await
            {
                tracing::warn!(error = %e, "Failed to publish message deleted event");
            }
        }

        Ok(())
    }

    /// Toggle a reaction on a message.
    ///
    /// Removes the caller's existing `(emoji)` reaction if present,
    /// otherwise adds one. Two racing adds are settled by the unique index:
    /// the loser sees a conflict and adopts the winner's row.
    pub async fn toggle_reaction(
        &self,
        user_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> AppResult<ToggleReactionResult> {
        if emoji.is_empty() {
            return Err(AppError::Validation("Emoji must not be empty".to_string()));
        }

        let message = self.message_repo.get_by_id(message_id).await?;

        self.permissions
            .require_membership(&message.channel_id, user_id)
            .await?;

        if message.is_deleted {
            return Err(AppError::Validation(
                "Cannot react to deleted message".to_string(),
            ));
        }

        let existing = self
            .reaction_repo
            .find_by_message_user_emoji(message_id, user_id, emoji)
            .await?;

        let result = if let Some(existing) = existing {
            self.reaction_repo.delete(&existing.id).await?;
            self.publish_toggle(&message, ToggleAction::Remove, &existing)
                .await;
            ToggleReactionResult {
                action: ToggleAction::Remove,
                reaction: None,
            }
        } else {
            let model = reaction::ActiveModel {
                id: Set(self.id_gen.generate()),
                message_id: Set(message_id.to_string()),
                user_id: Set(user_id.to_string()),
                emoji: Set(emoji.to_string()),
                created_at: Set(chrono::Utc::now().into()),
            };
            let created = match self.reaction_repo.create(model).await {
                Ok(created) => Some(created),
                Err(AppError::Conflict(_)) => {
                    // Lost a concurrent add; adopt the winner's row
                    tracing::debug!(message_id, user_id, emoji, "Concurrent reaction add");
                    self.reaction_repo
                        .find_by_message_user_emoji(message_id, user_id, emoji)
                        .await?
                }
                Err(e) => return Err(e),
            };
            if let Some(ref created) = created {
                self.publish_toggle(&message, ToggleAction::Add, created).await;
            }
            ToggleReactionResult {
                action: ToggleAction::Add,
                reaction: created,
            }
        };

        self.touch_presence(Some(&message.channel_id), user_id).await;

        Ok(result)
    }

    /// Record a read receipt: zero the caller's unread counter for the
    /// channel and remember the last-read message id.
    pub async fn mark_read(
        &self,
        user_id: &str,
        channel_id: &str,
        message_id: &str,
    ) -> AppResult<()> {
        self.permissions
            .require_membership(channel_id, user_id)
            .await?;

        if let Some(ref unread) = self.unread {
            unread.mark_read(channel_id, user_id, message_id).await?;
        }

        self.touch_presence(Some(channel_id), user_id).await;

        Ok(())
    }

    fn validate_send(input: &SendMessageInput) -> AppResult<()> {
        let has_content = input
            .content
            .as_ref()
            .is_some_and(|c| !c.trim().is_empty());
        if !has_content && input.attachments.is_empty() && input.attachment_ids.is_empty() {
            return Err(AppError::Validation(
                "Message must have content or attachments".to_string(),
            ));
        }
        if let Some(content) = &input.content {
            if content.chars().count() > MAX_CONTENT_LENGTH {
                return Err(AppError::Validation("Message content too long".to_string()));
            }
        }
        Ok(())
    }

    async fn create_attachments(
        &self,
        message: &message::Model,
        inputs: &[NewAttachment],
    ) -> AppResult<Vec<attachment::Model>> {
        if inputs.is_empty() {
            return Ok(vec![]);
        }

        let now = chrono::Utc::now();
        let models: Vec<attachment::Model> = inputs
            .iter()
            .map(|a| attachment::Model {
                id: self.id_gen.generate(),
                message_id: Some(message.id.clone()),
                file_name: a.file_name.clone(),
                file_type: a.file_type.clone(),
                size: a.size,
                blob_location: a.blob_location.clone(),
                created_at: now.into(),
            })
            .collect();

        let active: Vec<attachment::ActiveModel> = models
            .iter()
            .map(|m| attachment::ActiveModel {
                id: Set(m.id.clone()),
                message_id: Set(m.message_id.clone()),
                file_name: Set(m.file_name.clone()),
                file_type: Set(m.file_type.clone()),
                size: Set(m.size),
                blob_location: Set(m.blob_location.clone()),
                created_at: Set(m.created_at),
            })
            .collect();

        self.attachment_repo.create_many(active).await?;
        Ok(models)
    }

    /// Fetch pre-uploaded attachment rows, rejecting unknown ids and rows
    /// already bound to another message.
    async fn load_unbound_attachments(
        &self,
        ids: &[String],
    ) -> AppResult<Vec<attachment::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let models = self.attachment_repo.find_by_ids(ids).await?;
        if models.len() != ids.len() {
            return Err(AppError::Validation("Unknown attachment id".to_string()));
        }
        if models.iter().any(|m| m.message_id.is_some()) {
            return Err(AppError::Validation(
                "Attachment is already bound to a message".to_string(),
            ));
        }
        Ok(models)
    }

    async fn bind_attachments(
        &self,
        message: &message::Model,
        mut preuploaded: Vec<attachment::Model>,
    ) -> AppResult<Vec<attachment::Model>> {
        if preuploaded.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = preuploaded.iter().map(|m| m.id.clone()).collect();
        self.attachment_repo.bind_to_message(&ids, &message.id).await?;

        for m in &mut preuploaded {
            m.message_id = Some(message.id.clone());
        }
        Ok(preuploaded)
    }

    async fn create_mentions(&self, message_id: &str, content: &str) -> AppResult<()> {
        let mentioned = huddle_mentions::extract_mentioned_user_ids(content);
        if mentioned.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now();
        let models: Vec<mention::ActiveModel> = mentioned
            .into_iter()
            .map(|user_id| mention::ActiveModel {
                id: Set(self.id_gen.generate()),
                message_id: Set(message_id.to_string()),
                mentioned_user_id: Set(user_id),
                created_at: Set(now.into()),
            })
            .collect();

        self.mention_repo.create_many(models).await
    }

    async fn publish_toggle(
        &self,
        message: &message::Model,
        action: ToggleAction,
        reaction: &reaction::Model,
    ) {
        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher
                .publish_reaction_toggled(
                    &message.id,
                    &message.channel_id,
                    action.as_str(),
                    reaction,
                )
                .await
            {
                tracing::warn!(error = %e, "Failed to publish reaction toggled event");
            }
        }
    }

    async fn touch_presence(&self, channel_id: Option<&str>, user_id: &str) {
        if let Some(ref presence) = self.presence {
            if let Err(e) = presence.mark_active(channel_id, user_id).await {
                tracing::warn!(error = %e, "Failed to refresh presence");
            }
        }
    }
}
