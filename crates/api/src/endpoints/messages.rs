//! Message mutation endpoints.
//!
//! Creation lives under the channel routes; everything addressed by a
//! message id lands here.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, patch, put},
};
use chrono::{DateTime, Utc};
use huddle_common::AppResult;
use huddle_db::entities::{attachment, message, reaction};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response, response::ApiResponse};

/// Create message router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{message_id}", patch(update_message))
        .route("/{message_id}", delete(delete_message))
        .route("/{message_id}/reactions", put(toggle_reaction))
}

/// Message response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub channel_id: String,
    pub user_id: String,
    pub content: Option<String>,
    pub parent_message_id: Option<String>,
    pub is_edited: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub attachments: Vec<AttachmentResponse>,
    pub reactions: Vec<ReactionResponse>,
}

impl From<message::Model> for MessageResponse {
    fn from(msg: message::Model) -> Self {
        Self {
            id: msg.id,
            channel_id: msg.channel_id,
            user_id: msg.user_id,
            content: msg.content,
            parent_message_id: msg.parent_message_id,
            is_edited: msg.is_edited,
            is_deleted: msg.is_deleted,
            created_at: msg.created_at.into(),
            updated_at: msg.updated_at.into(),
            attachments: Vec::new(),
            reactions: Vec::new(),
        }
    }
}

/// Attachment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub id: String,
    pub file_name: String,
    pub file_type: String,
    pub size: i64,
    pub blob_location: String,
    pub created_at: DateTime<Utc>,
}

impl From<attachment::Model> for AttachmentResponse {
    fn from(a: attachment::Model) -> Self {
        Self {
            id: a.id,
            file_name: a.file_name,
            file_type: a.file_type,
            size: a.size,
            blob_location: a.blob_location,
            created_at: a.created_at.into(),
        }
    }
}

/// Reaction response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionResponse {
    pub id: String,
    pub user_id: String,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

impl From<reaction::Model> for ReactionResponse {
    fn from(r: reaction::Model) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            emoji: r.emoji,
            created_at: r.created_at.into(),
        }
    }
}

/// Update message request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessageRequest {
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
}

/// Edit a message's content. Author-only.
async fn update_message(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Json(payload): Json<UpdateMessageRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    payload.validate()?;

    let updated = state
        .chat_service
        .update_message(&user_id, &message_id, payload.content)
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Soft-delete a message.
///
/// Allowed for the author, the channel owner, or a moderator holding the
/// manage-messages permission.
async fn delete_message(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.chat_service.delete_message(&user_id, &message_id).await?;
    Ok(response::ok())
}

/// Toggle reaction request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToggleReactionRequest {
    #[validate(length(min = 1, max = 64))]
    pub emoji: String,
}

/// Toggle reaction response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleReactionResponse {
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction: Option<ReactionResponse>,
}

/// Add or remove the caller's reaction with the given emoji.
async fn toggle_reaction(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Json(payload): Json<ToggleReactionRequest>,
) -> AppResult<ApiResponse<ToggleReactionResponse>> {
    payload.validate()?;

    let result = state
        .chat_service
        .toggle_reaction(&user_id, &message_id, &payload.emoji)
        .await?;

    Ok(ApiResponse::ok(ToggleReactionResponse {
        action: result.action.as_str(),
        reaction: result.reaction.map(ReactionResponse::from),
    }))
}
