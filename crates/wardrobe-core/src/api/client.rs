//! API client for the wardrobe backend.
//!
//! Every outbound call goes through [`ApiClient::request`], which attaches the
//! bearer token, applies the default content type, and normalizes the reply
//! into an [`ApiResponse`] or an [`ApiError`].

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{
    ChatRequest, ChatResponse, ClothingItem, ClothingItemCreate, Credentials, Registration,
    ScreenshotUpload, TokenResponse, User, WaitlistItem, WaitlistItemCreate,
};

use super::{ApiError, ApiResponse};

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const TOKEN_PATH: &str = "/auth/token";
const REGISTER_PATH: &str = "/auth/register";
const CHAT_PATH: &str = "/api/v1/agent/chat";
const WARDROBE_ITEMS_PATH: &str = "/wardrobe/items";
const WAITLIST_ITEMS_PATH: &str = "/waitlist/items";
const WAITLIST_SCREENSHOT_PATH: &str = "/waitlist/upload-screenshot";
const EXTENSION_DOWNLOAD_PATH: &str = "/waitlist/download-extension";

// ============================================================================
// Request descriptor
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// Already `application/x-www-form-urlencoded`
    Form(String),
}

/// One outbound call: relative path, method, optional body, extra headers.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub path: String,
    pub method: Method,
    pub body: Option<RequestBody>,
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Attach form fields, encoded now, and switch the content type to match
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.body = Some(RequestBody::Form(encoded));
        self.header(header::CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
    }

    /// Add or override a header. Overrides win over the client defaults.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client for the wardrobe backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for `base_url` with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::with_timeout(config.api_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Default headers, then the caller's overrides, then the bearer token.
    fn headers(&self, overrides: &HeaderMap) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        for (name, value) in overrides {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Send one request and normalize the reply.
    ///
    /// A non-success status becomes [`ApiError::Request`] carrying the message
    /// extracted from the body. A success is returned as JSON, binary, or text
    /// depending only on its `Content-Type`.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let ApiRequest {
            path,
            method,
            body,
            headers,
        } = request;

        let url = self.url(&path);
        let headers = self.headers(&headers)?;
        debug!(%method, path = %path, authorized = self.token.is_some(), "Sending API request");

        let builder = self.client.request(method, &url).headers(headers);
        let builder = match body {
            Some(RequestBody::Json(value)) => builder.body(value.to_string()),
            Some(RequestBody::Form(encoded)) => builder.body(encoded),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                path = %path,
                body = %ApiError::truncate_body(&body),
                "API request failed"
            );
            return Err(ApiError::from_status(status, &body));
        }

        ApiResponse::read(response).await
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.request(request).await?.into_json()
    }

    // ===== Auth =====

    /// Exchange credentials for a bearer token (form-encoded, OAuth2 password flow)
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let request = ApiRequest::post(TOKEN_PATH).form(&[
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ]);
        self.fetch_json(request).await
    }

    pub async fn register(&self, data: &Registration) -> Result<User, ApiError> {
        self.fetch_json(ApiRequest::post(REGISTER_PATH).json(data)?).await
    }

    // ===== Assistant =====

    pub async fn chat(&self, message: &ChatRequest) -> Result<ChatResponse, ApiError> {
        self.fetch_json(ApiRequest::post(CHAT_PATH).json(message)?).await
    }

    // ===== Wardrobe =====

    pub async fn wardrobe_items(&self) -> Result<Vec<ClothingItem>, ApiError> {
        self.fetch_json(ApiRequest::get(WARDROBE_ITEMS_PATH)).await
    }

    pub async fn create_wardrobe_item(
        &self,
        item: &ClothingItemCreate,
    ) -> Result<ClothingItem, ApiError> {
        self.fetch_json(ApiRequest::post(WARDROBE_ITEMS_PATH).json(item)?).await
    }

    // ===== Waitlist =====

    pub async fn waitlist_items(&self) -> Result<Vec<WaitlistItem>, ApiError> {
        self.fetch_json(ApiRequest::get(WAITLIST_ITEMS_PATH)).await
    }

    pub async fn add_waitlist_item(
        &self,
        item: &WaitlistItemCreate,
    ) -> Result<WaitlistItem, ApiError> {
        self.fetch_json(ApiRequest::post(WAITLIST_ITEMS_PATH).json(item)?).await
    }

    pub async fn upload_waitlist_screenshot(
        &self,
        upload: &ScreenshotUpload,
    ) -> Result<WaitlistItem, ApiError> {
        self.fetch_json(ApiRequest::post(WAITLIST_SCREENSHOT_PATH).json(upload)?).await
    }

    /// Download the browser extension archive
    pub async fn download_extension(&self) -> Result<Bytes, ApiError> {
        self.request(ApiRequest::get(EXTENSION_DOWNLOAD_PATH))
            .await?
            .into_bytes()
    }
}
