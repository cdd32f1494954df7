//! Utility functions for display formatting and timestamp handling.

pub mod format;
pub mod time;

// Re-export commonly used functions at module level
pub use format::{format_timestamp, initials, truncate};
pub use time::parse_timestamp;
