//! API endpoints.

mod attachments;
mod channels;
mod messages;
mod presence;
mod unread;

use axum::{Router, routing::get};

use crate::middleware::AppState;
use crate::streaming;

pub use messages::{AttachmentResponse, MessageResponse, ReactionResponse};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/attachments", attachments::router())
        .nest("/channels", channels::router())
        .nest("/messages", messages::router())
        .nest("/unread", unread::router())
        .nest("/presence", presence::router())
        .route("/streaming", get(streaming::streaming_handler))
}
