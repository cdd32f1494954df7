use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-success status. `message` is the best
    /// human-readable text found in the response body.
    #[error("{message}")]
    Request { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Maximum length for error response bodies in log lines
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        ApiError::Request {
            status,
            message: Self::extract_message(status, body),
        }
    }

    /// Pick the message to surface for a failed request.
    ///
    /// A JSON body is searched for `detail[0].msg`, then `detail`, then
    /// `message`. A body that is not JSON at all degrades to the status text.
    pub fn extract_message(status: StatusCode, body: &str) -> String {
        let found = match serde_json::from_str::<Value>(body) {
            Ok(value) => message_from_json(&value),
            Err(_) => status.canonical_reason().map(str::to_string).filter(|s| !s.is_empty()),
        };
        found.unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
    }

    /// HTTP status for errors that came back from the server
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            ApiError::NetworkError(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

fn message_from_json(value: &Value) -> Option<String> {
    let detail = value.get("detail");
    detail
        .and_then(|d| d.get(0))
        .and_then(|first| first.get("msg"))
        .and_then(present)
        .or_else(|| detail.and_then(present))
        .or_else(|| value.get("message").and_then(present))
}

/// Render a JSON value as message text, skipping empty and falsy values
fn present(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(items) if !items.is_empty() => Some(value.to_string()),
        Value::Object(fields) if !fields.is_empty() => Some(value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_detail_list() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"field required","type":"value_error.missing"}]}"#;
        assert_eq!(
            ApiError::extract_message(StatusCode::UNPROCESSABLE_ENTITY, body),
            "field required"
        );
    }

    #[test]
    fn test_plain_detail() {
        let body = r#"{"detail":"bad request"}"#;
        assert_eq!(ApiError::extract_message(StatusCode::BAD_REQUEST, body), "bad request");
    }

    #[test]
    fn test_message_field() {
        let body = r#"{"message":"quota exceeded"}"#;
        assert_eq!(ApiError::extract_message(StatusCode::FORBIDDEN, body), "quota exceeded");
    }

    #[test]
    fn test_unparsable_body_uses_status_text() {
        assert_eq!(
            ApiError::extract_message(StatusCode::BAD_GATEWAY, "<html>upstream down</html>"),
            "Bad Gateway"
        );
        assert_eq!(
            ApiError::extract_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "Internal Server Error"
        );
    }

    #[test]
    fn test_json_without_known_fields_falls_back_to_status_code() {
        assert_eq!(
            ApiError::extract_message(StatusCode::CONFLICT, r#"{"error":"duplicate"}"#),
            "Request failed with status 409"
        );
        assert_eq!(
            ApiError::extract_message(StatusCode::CONFLICT, r#"{"detail":""}"#),
            "Request failed with status 409"
        );
    }

    #[test]
    fn test_detail_list_without_msg_is_rendered() {
        let body = r#"{"detail":[{"code":7}]}"#;
        assert_eq!(
            ApiError::extract_message(StatusCode::BAD_REQUEST, body),
            r#"[{"code":7}]"#
        );
    }

    #[test]
    fn test_from_status_keeps_status() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"detail":"Incorrect username or password"}"#);
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Incorrect username or password");
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let body = "ж".repeat(400);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.contains("truncated, 800 total bytes"));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }
}
