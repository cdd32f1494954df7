//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: the login/logout state machine and its accessors
//! - `SessionStorage`: the persisted token + user entries, with file,
//!   OS keychain (`KeyringStorage`) and in-memory backends
//!
//! A restored session is trusted as-is; the token is not re-validated
//! against the server until the next request.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStorage;
pub use session::{Route, SessionData, SessionState, SessionStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, TOKEN_KEY, USER_KEY};
