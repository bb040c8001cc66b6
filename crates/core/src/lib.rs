//! Core business logic for huddle-rs.

pub mod services;

pub use services::*;
