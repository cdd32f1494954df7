//! Core library for wardrobe, a client for an AI outfit assistant backend.
//!
//! - [`api`]: the single HTTP entry point, response envelope and errors
//! - [`auth`]: session store and persisted session storage
//! - [`chat`]: assistant conversation transcript
//! - [`models`]: request/response types and form validation
//! - [`config`]: configuration file and environment overrides

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiResponse};
pub use auth::{Route, SessionState, SessionStore};
pub use chat::Conversation;
pub use config::Config;
