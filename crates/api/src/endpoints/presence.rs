//! Global presence endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use huddle_common::AppResult;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

use super::channels::{PresenceEntry, PresenceListResponse};

/// Create presence router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(global_presence))
        .route("/{user_id}/online", get(is_online))
}

/// Users recently active anywhere.
async fn global_presence(
    AuthUser(_user_id): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PresenceListResponse>> {
    let active = state
        .presence
        .list_active(None)
        .await?
        .into_iter()
        .map(|(user_id, last_active_at)| PresenceEntry {
            user_id,
            last_active_at,
        })
        .collect();

    Ok(ApiResponse::ok(PresenceListResponse { active }))
}

/// Online flag response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineResponse {
    pub user_id: String,
    pub online: bool,
}

/// Point lookup of one user's online flag.
async fn is_online(
    AuthUser(_caller): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<OnlineResponse>> {
    let online = state.presence.is_online(&user_id).await?;
    Ok(ApiResponse::ok(OnlineResponse { user_id, online }))
}
