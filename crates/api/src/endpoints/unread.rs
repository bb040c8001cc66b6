//! Unread counter endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use huddle_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create unread router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_counts))
        .route("/{channel_id}", get(get_channel_state))
}

/// Unread counts query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountsQuery {
    /// Comma-separated channel ids.
    pub channel_ids: String,
}

/// One channel's unread count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub channel_id: String,
    pub count: i64,
}

/// Unread counts response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountsResponse {
    pub counts: Vec<UnreadCount>,
}

/// Badge counts for the listed channels in one round trip.
///
/// Counts are advisory; a channel with no counter reads as zero.
async fn get_counts(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UnreadCountsQuery>,
) -> AppResult<ApiResponse<UnreadCountsResponse>> {
    let channel_ids: Vec<String> = query
        .channel_ids
        .split(',')
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    let mut counts = state.unread.get_counts(&user_id, &channel_ids).await?;

    // Preserve the requested order
    let counts = channel_ids
        .into_iter()
        .map(|channel_id| {
            let count = counts.remove(&channel_id).unwrap_or(0);
            UnreadCount { channel_id, count }
        })
        .collect();

    Ok(ApiResponse::ok(UnreadCountsResponse { counts }))
}

/// One channel's unread state response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelUnreadResponse {
    pub channel_id: String,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_read_message_id: Option<String>,
}

/// Unread count plus the last-read marker for one channel.
async fn get_channel_state(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<ChannelUnreadResponse>> {
    let count = state.unread.get_count(&channel_id, &user_id).await?;
    let last_read_message_id = state.unread.get_last_read(&channel_id, &user_id).await?;

    Ok(ApiResponse::ok(ChannelUnreadResponse {
        channel_id,
        count,
        last_read_message_id,
    }))
}
