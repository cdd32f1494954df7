use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::time::{option_utc_timestamp, utc_timestamp};

/// Login form input. `username` carries the account e-mail.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    #[serde(with = "utc_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "option_utc_timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Local placeholder profile recorded after a token login.
    ///
    /// The token endpoint returns no profile, so the record is derived from
    /// the login identifier: the id is the login time in epoch millis and the
    /// username is the part of the e-mail before `@`.
    pub fn from_login(identifier: &str) -> Self {
        let now = Utc::now();
        let username = identifier
            .split_once('@')
            .map_or(identifier, |(local, _)| local);
        Self {
            id: now.timestamp_millis(),
            email: identifier.to_string(),
            username: username.to_string(),
            is_active: true,
            created_at: now,
            updated_at: None,
        }
    }

    pub fn initials(&self) -> String {
        crate::utils::initials(&self.email)
    }
}
