//! REST API client module for the wardrobe backend.
//!
//! This module provides the `ApiClient`, the single point through which the
//! application talks to the backend (auth, assistant chat, wardrobe and
//! waitlist services).
//!
//! Authenticated calls carry a bearer token issued by `/auth/token`.

pub mod client;
pub mod error;
pub mod response;

pub use client::{ApiClient, ApiRequest, RequestBody};
pub use error::ApiError;
pub use response::{ApiResponse, ResponseKind};
