use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::validation::{require, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingItemCreate {
    pub name: String,
    pub image_url: String,
    /// Free-form attributes (colour, season, ...) stored as-is by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Map<String, Value>>,
}

impl ClothingItemCreate {
    pub fn new(name: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_url: image_url.into(),
            features: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("image_url", &self.image_url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingItem {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub image_url: String,
    #[serde(default)]
    pub features: Option<Map<String, Value>>,
}
