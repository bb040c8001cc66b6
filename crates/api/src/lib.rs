//! HTTP API layer for huddle-rs.
//!
//! This crate provides the REST API and the WebSocket stream:
//!
//! - **Endpoints**: channel history, message mutations, read receipts,
//!   unread counts, presence
//! - **Extractors**: gateway-authenticated user identity
//! - **Middleware**: authentication, application state
//! - **Streaming**: room-scoped WebSocket fan-out
//!
//! Built on Axum 0.8 with Tower middleware stack.

// Allow dead_code for API compatibility fields in request structs
#![allow(dead_code)]

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

pub use endpoints::router;
pub use middleware::AppState;
pub use streaming::streaming_handler;
