//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use huddle_core::{AttachmentService, ChatService, PermissionService};
use huddle_realtime::{RedisPresenceTracker, RedisPubSub, RedisUnreadLedger};

use crate::extractors::UserId;

/// Header carrying the identity established by the edge gateway.
pub const USER_ID_HEADER: &str = "x-huddle-user-id";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: ChatService,
    pub attachment_service: AttachmentService,
    pub permissions: PermissionService,
    pub presence: RedisPresenceTracker,
    pub unread: RedisUnreadLedger,
    pub pubsub: RedisPubSub,
}

/// Authentication middleware.
///
/// Requests reach this service through an authenticating gateway that
/// resolves credentials and forwards the user id in [`USER_ID_HEADER`].
/// Handlers that need an identity reject through the `AuthUser` extractor.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Response {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|header| header.to_str().ok())
        .filter(|user_id| !user_id.is_empty())
        .map(ToString::to_string);
    if let Some(user_id) = user_id {
        req.extensions_mut().insert(UserId(user_id));
    }

    next.run(req).await
}
