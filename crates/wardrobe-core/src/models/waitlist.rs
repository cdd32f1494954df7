use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{require, ValidationError};
use crate::utils::time::utc_timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistItemCreate {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl WaitlistItemCreate {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            status: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("image_url", &self.image_url)
    }
}

/// Screenshot sent inline as a data URL (`data:image/png;base64,...`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotUpload {
    pub image_base64: String,
}

impl ScreenshotUpload {
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Result<Self, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::EmptyScreenshot);
        }
        Ok(Self {
            image_base64: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        })
    }

    /// Read an image file and encode it, inferring the MIME type from the extension
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read screenshot: {}", path.display()))?;
        Ok(Self::from_bytes(mime_for_path(path), &bytes)?)
    }
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistItem {
    pub id: i64,
    pub user_id: i64,
    pub image_url: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(with = "utc_timestamp")]
    pub created_at: DateTime<Utc>,
}
