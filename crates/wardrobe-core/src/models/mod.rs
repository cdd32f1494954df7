//! Request and response models for the wardrobe backend.
//!
//! - `User`, `Credentials`, `Registration`, `TokenResponse`: authentication
//! - `ChatRequest`, `ChatResponse`: the outfit assistant
//! - `ClothingItem`, `ClothingItemCreate`: wardrobe contents
//! - `WaitlistItem`, `WaitlistItemCreate`, `ScreenshotUpload`: wish list
//! - `ValidationError`: form checks that run before any request is sent

pub mod chat;
pub mod user;
pub mod validation;
pub mod waitlist;
pub mod wardrobe;

pub use chat::{ChatRequest, ChatResponse};
pub use user::{Credentials, Registration, TokenResponse, User};
pub use validation::ValidationError;
pub use waitlist::{ScreenshotUpload, WaitlistItem, WaitlistItemCreate};
pub use wardrobe::{ClothingItem, ClothingItemCreate};
