//! Attachment pre-upload endpoints.
//!
//! Blobs are uploaded here first; the returned id is passed to a later
//! send, which binds the row to the new message.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use huddle_common::{AppError, AppResult};
use huddle_core::services::UploadAttachmentInput;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

use super::messages::AttachmentResponse;

/// Create attachment router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload))
        .route("/{attachment_id}/url", get(download_url))
}

/// Upload request. `data` is standard base64.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1, max = 255))]
    pub file_type: String,
    pub data: String,
}

/// Upload a blob ahead of the message that will carry it.
async fn upload(
    AuthUser(_user_id): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UploadRequest>,
) -> AppResult<ApiResponse<AttachmentResponse>> {
    payload.validate()?;

    let data = STANDARD
        .decode(&payload.data)
        .map_err(|_| AppError::Validation("Invalid base64 data".to_string()))?;

    let model = state
        .attachment_service
        .upload(UploadAttachmentInput {
            file_name: payload.file_name,
            file_type: payload.file_type,
            data,
        })
        .await?;

    Ok(ApiResponse::ok(model.into()))
}

/// Download URL response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrlResponse {
    pub url: String,
}

/// Time-limited download link for an attachment's blob.
async fn download_url(
    AuthUser(_user_id): AuthUser,
    State(state): State<AppState>,
    Path(attachment_id): Path<String>,
) -> AppResult<ApiResponse<DownloadUrlResponse>> {
    let model = state.attachment_service.get_by_id(&attachment_id).await?;
    let url = state.attachment_service.download_url(&model);

    Ok(ApiResponse::ok(DownloadUrlResponse { url }))
}
