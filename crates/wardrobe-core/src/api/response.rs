//! Response envelope returned by [`ApiClient::request`](super::ApiClient::request).
//!
//! The shape of a successful response is decided once, from its declared
//! `Content-Type`, and never re-guessed by callers.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ApiError;

/// Which payload shape a response carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    Binary,
    Text,
}

impl ResponseKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.contains("application/json") => ResponseKind::Json,
            Some(ct) if ct.contains("application/zip") => ResponseKind::Binary,
            _ => ResponseKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    Binary(Bytes),
    Text(String),
}

impl ApiResponse {
    /// Read a successful response body into the matching variant
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, ApiError> {
        let kind = ResponseKind::from_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );

        match kind {
            ResponseKind::Json => {
                let body = response.bytes().await?;
                serde_json::from_slice(&body).map(ApiResponse::Json).map_err(|e| {
                    ApiError::InvalidResponse(format!("body declared as JSON did not parse: {}", e))
                })
            }
            ResponseKind::Binary => Ok(ApiResponse::Binary(response.bytes().await?)),
            ResponseKind::Text => Ok(ApiResponse::Text(response.text().await?)),
        }
    }

    pub fn kind(&self) -> ResponseKind {
        match self {
            ApiResponse::Json(_) => ResponseKind::Json,
            ApiResponse::Binary(_) => ResponseKind::Binary,
            ApiResponse::Text(_) => ResponseKind::Text,
        }
    }

    /// Decode a JSON payload into `T`
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::Json(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::InvalidResponse(format!("unexpected JSON shape: {}", e))),
            other => Err(other.mismatch("JSON")),
        }
    }

    pub fn into_bytes(self) -> Result<Bytes, ApiError> {
        match self {
            ApiResponse::Binary(bytes) => Ok(bytes),
            other => Err(other.mismatch("binary")),
        }
    }

    fn mismatch(&self, expected: &str) -> ApiError {
        ApiError::InvalidResponse(format!("expected a {} payload, got {:?}", expected, self.kind()))
    }
}
