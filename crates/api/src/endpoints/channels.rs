//! Channel-scoped endpoints: history, sending, read receipts, presence.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use huddle_common::AppResult;
use huddle_core::services::chat::{NewAttachment, SendMessageInput};
use huddle_db::cursor::MessageCursor;
use huddle_db::repositories::{MessageQuery, ParentFilter, SortDirection};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response, response::ApiResponse};

use super::messages::{AttachmentResponse, MessageResponse, ReactionResponse};

/// Create channel router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{channel_id}/messages", post(send_message))
        .route("/{channel_id}/messages", get(list_messages))
        .route("/{channel_id}/read", post(mark_read))
        .route("/{channel_id}/presence", get(channel_presence))
}

/// Attachment metadata for a blob uploaded ahead of the message.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentUpload {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1, max = 255))]
    pub file_type: String,
    #[validate(range(min = 0))]
    pub size: i64,
    #[validate(length(min = 1))]
    pub blob_location: String,
}

/// Send message request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(max = 4000))]
    pub content: Option<String>,
    pub parent_message_id: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<AttachmentUpload>,
    /// Ids returned by the attachment pre-upload endpoint.
    #[serde(default)]
    pub attachment_ids: Vec<String>,
}

/// Send a message to a channel.
async fn send_message(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    payload.validate()?;

    let result = state
        .chat_service
        .send_message(SendMessageInput {
            user_id,
            channel_id,
            content: payload.content,
            parent_message_id: payload.parent_message_id,
            attachments: payload
                .attachments
                .into_iter()
                .map(|a| NewAttachment {
                    file_name: a.file_name,
                    file_type: a.file_type,
                    size: a.size,
                    blob_location: a.blob_location,
                })
                .collect(),
            attachment_ids: payload.attachment_ids,
        })
        .await?;

    let mut message = MessageResponse::from(result.message);
    message.attachments = result
        .attachments
        .into_iter()
        .map(AttachmentResponse::from)
        .collect();

    Ok(ApiResponse::ok(message))
}

/// Sort order query parameter.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortParam {
    /// Newest first, the reading-history direction.
    #[default]
    Newest,
    /// Oldest first, the catch-up direction.
    Oldest,
}

impl From<SortParam> for SortDirection {
    fn from(sort: SortParam) -> Self {
        match sort {
            SortParam::Newest => Self::Newest,
            SortParam::Oldest => Self::Oldest,
        }
    }
}

/// List messages query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Opaque token from a previous page's `nextCursor`.
    pub cursor: Option<String>,
    #[serde(default)]
    pub sort: SortParam,
    /// Restrict to replies of this message.
    pub parent_message_id: Option<String>,
    /// Mix replies into the top-level listing.
    #[serde(default)]
    pub include_replies: bool,
    #[serde(default)]
    pub include_deleted: bool,
}

const fn default_limit() -> u64 {
    50
}

/// Message list response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListResponse {
    pub messages: Vec<MessageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// List a channel's messages, newest first unless asked otherwise.
async fn list_messages(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<ListMessagesQuery>,
) -> AppResult<ApiResponse<MessageListResponse>> {
    let cursor = query
        .cursor
        .as_deref()
        .map(MessageCursor::decode)
        .transpose()?;

    let parent = match query.parent_message_id {
        Some(parent_id) => ParentFilter::Replies(parent_id),
        None if query.include_replies => ParentFilter::Any,
        None => ParentFilter::TopLevel,
    };

    let result = state
        .chat_service
        .get_channel_messages(
            &user_id,
            MessageQuery {
                channel_id,
                limit: Some(query.limit),
                cursor,
                direction: query.sort.into(),
                parent,
                include_deleted: query.include_deleted,
            },
        )
        .await?;

    let mut attachments = result.attachments;
    let mut reactions = result.reactions;

    let messages = result
        .messages
        .into_iter()
        .map(|m| {
            let id = m.id.clone();
            let mut response = MessageResponse::from(m);
            response.attachments = attachments
                .remove(&id)
                .unwrap_or_default()
                .into_iter()
                .map(AttachmentResponse::from)
                .collect();
            response.reactions = reactions
                .remove(&id)
                .unwrap_or_default()
                .into_iter()
                .map(ReactionResponse::from)
                .collect();
            response
        })
        .collect();

    Ok(ApiResponse::ok(MessageListResponse {
        messages,
        next_cursor: result.next_cursor,
    }))
}

/// Mark read request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub message_id: String,
}

/// Record a read receipt for the channel.
async fn mark_read(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(payload): Json<MarkReadRequest>,
) -> AppResult<impl IntoResponse> {
    state
        .chat_service
        .mark_read(&user_id, &channel_id, &payload.message_id)
        .await?;
    Ok(response::ok())
}

/// Presence entry response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub user_id: String,
    /// Last activity as a unix timestamp.
    pub last_active_at: i64,
}

/// Channel presence response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceListResponse {
    pub active: Vec<PresenceEntry>,
}

/// Users recently active in a channel. Members only.
async fn channel_presence(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<PresenceListResponse>> {
    state.permissions.require_membership(&channel_id, &user_id).await?;

    let active = state
        .presence
        .list_active(Some(&channel_id))
        .await?
        .into_iter()
        .map(|(user_id, last_active_at)| PresenceEntry {
            user_id,
            last_active_at,
        })
        .collect();

    Ok(ApiResponse::ok(PresenceListResponse { active }))
}
