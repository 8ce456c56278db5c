//! REST API client module for the Lectern backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! Lectern API: courses, lessons, quizzes, assignments, enrollments,
//! reviews, payments, and account management.
//!
//! The API uses JWT bearer token authentication; expired access tokens
//! are refreshed transparently inside the request pipeline.

pub mod client;
pub mod error;
pub mod request;

pub use client::ApiClient;
pub use error::ApiError;
pub use request::ApiRequest;
