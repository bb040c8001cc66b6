//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};

/// Identity of the authenticated user, as set by the auth middleware.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get user id from request extensions (set by auth middleware)
        parts
            .extensions
            .get::<UserId>()
            .cloned()
            .map(|UserId(id)| Self(id))
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}
