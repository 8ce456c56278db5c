//! Lectern client - a typed Rust client for the Lectern learning platform.
//!
//! This crate provides:
//! - `ApiClient`: authenticated access to every Lectern REST endpoint
//! - `TokenVault`: durable/session token storage behind pluggable scopes
//! - `models`: serde types for courses, lessons, quizzes, and the rest
//!
//! Expired access tokens are refreshed transparently inside the request
//! pipeline; callers see a single request that either succeeds or fails
//! with a classified [`ApiError`].

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ApiRequest};
pub use auth::{
    AuthEvent, ChannelEvents, FileScope, KeyringScope, MemoryScope, NullEvents, SessionEvents,
    TokenScope, TokenVault,
};
pub use config::Config;
