use anyhow::{bail, Result};
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{Credentials, Registration, User};

use super::storage::{SessionStorage, TOKEN_KEY, USER_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// A login or registration request is in flight
    Authenticating,
    Authenticated,
}

/// Where the UI should go after a session transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/dashboard",
            Route::Login => "/auth/login",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub token: String,
    pub user: User,
}

/// Owner of the current session and its persisted copy.
///
/// Token and user are always set and cleared together. While
/// `Authenticated`, the token is held here and in storage; while
/// `Unauthenticated`, storage holds neither entry.
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    state: SessionState,
    data: Option<SessionData>,
}

impl SessionStore {
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        Self {
            storage,
            state: SessionState::Unauthenticated,
            data: None,
        }
    }

    /// Load the persisted session, if any. Returns true when authenticated.
    ///
    /// The token is trusted without a server round-trip. A half-written or
    /// unreadable session is wiped.
    pub fn restore(&mut self) -> Result<bool> {
        let entries = self
            .storage
            .get(TOKEN_KEY)
            .and_then(|token| Ok((token, self.storage.get(USER_KEY)?)));
        let (token, user) = match entries {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Stored session is unreadable, discarding it");
                self.clear()?;
                return Ok(false);
            }
        };

        match (token, user) {
            (None, None) => {
                debug!("No stored session");
                self.state = SessionState::Unauthenticated;
                self.data = None;
                return Ok(false);
            }
            (Some(token), Some(user)) if !token.is_empty() => {
                match serde_json::from_str::<User>(&user) {
                    Ok(user) => {
                        debug!(username = %user.username, "Session restored");
                        self.data = Some(SessionData { token, user });
                        self.state = SessionState::Authenticated;
                        return Ok(true);
                    }
                    Err(e) => warn!(error = %e, "Stored user record is unreadable, discarding session"),
                }
            }
            _ => warn!("Stored session is incomplete, discarding it"),
        }

        self.clear()?;
        Ok(false)
    }

    /// Exchange credentials for a token and record the session.
    ///
    /// On failure any previous session is cleared as well.
    pub async fn login(&mut self, api: &ApiClient, credentials: &Credentials) -> Result<Route> {
        self.begin()?;

        let token = match api.login(credentials).await {
            Ok(response) if !response.access_token.is_empty() => response.access_token,
            Ok(_) => {
                self.clear_after_failure();
                bail!(ApiError::InvalidResponse(
                    "token endpoint returned an empty access token".to_string()
                ));
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.clear_after_failure();
                return Err(e.into());
            }
        };

        // The token endpoint returns no profile; see User::from_login
        let user = User::from_login(&credentials.username);
        if let Err(e) = self.persist(&token, &user) {
            error!(error = %e, "Failed to persist session");
            self.clear_after_failure();
            return Err(e);
        }

        info!(username = %user.username, "Login successful");
        self.data = Some(SessionData { token, user });
        self.state = SessionState::Authenticated;
        Ok(Route::Dashboard)
    }

    /// Create an account. Does not sign in; the caller is sent to the login page.
    pub async fn register(&mut self, api: &ApiClient, data: &Registration) -> Result<(User, Route)> {
        let previous = self.begin()?;
        let result = api.register(data).await;
        self.state = previous;

        match result {
            Ok(user) => {
                info!(username = %user.username, "Registration successful");
                Ok((user, Route::Login))
            }
            Err(e) => {
                error!(error = %e, "Registration failed");
                Err(e.into())
            }
        }
    }

    /// Drop the session regardless of its current state
    pub fn logout(&mut self) -> Result<Route> {
        self.clear()?;
        info!("Logged out");
        Ok(Route::Login)
    }

    /// Clear memory and both persisted entries
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        self.state = SessionState::Unauthenticated;
        let token_removed = self.storage.remove(TOKEN_KEY);
        let user_removed = self.storage.remove(USER_KEY);
        token_removed.and(user_removed)
    }

    /// Copy the current token, or its absence, into an API client
    pub fn authorize(&self, api: &mut ApiClient) {
        match self.token() {
            Some(token) => api.set_token(token.to_string()),
            None => api.clear_token(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn data(&self) -> Option<&SessionData> {
        self.data.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.data.as_ref().map(|d| &d.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// True while a login or registration is outstanding; submit controls stay disabled
    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Authenticating
    }

    pub fn storage(&self) -> &dyn SessionStorage {
        self.storage.as_ref()
    }

    /// Give up the store, keeping its storage (e.g. to simulate a restart)
    pub fn into_storage(self) -> Box<dyn SessionStorage> {
        self.storage
    }

    fn begin(&mut self) -> Result<SessionState> {
        if self.state == SessionState::Authenticating {
            bail!("An authentication request is already in progress");
        }
        let previous = self.state;
        self.state = SessionState::Authenticating;
        Ok(previous)
    }

    fn persist(&mut self, token: &str, user: &User) -> Result<()> {
        let user_json = serde_json::to_string(user)?;
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(USER_KEY, &user_json)?;
        Ok(())
    }

    fn clear_after_failure(&mut self) {
        if let Err(e) = self.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{FileStorage, MemoryStorage};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn storage_with(entries: &[(&str, &str)]) -> Box<dyn SessionStorage> {
        let mut storage = MemoryStorage::new();
        for (key, value) in entries {
            storage.set(key, value).unwrap();
        }
        Box::new(storage)
    }

    fn stored_user() -> String {
        serde_json::to_string(&User::from_login("anna@example.com")).unwrap()
    }

    #[test]
    fn test_restore_empty_storage() {
        let mut store = SessionStore::new(storage_with(&[]));
        assert!(!store.restore().unwrap());
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert!(store.token().is_none());
    }

    #[test]
    fn test_restore_complete_session() {
        let user = stored_user();
        let mut store = SessionStore::new(storage_with(&[(TOKEN_KEY, "tok"), (USER_KEY, user.as_str())]));
        assert!(store.restore().unwrap());
        assert!(store.is_authenticated());
        assert_eq!(store.token(), Some("tok"));
        assert_eq!(store.user().map(|u| u.email.as_str()), Some("anna@example.com"));
    }

    #[test]
    fn test_restore_token_without_user_is_wiped() {
        let mut store = SessionStore::new(storage_with(&[(TOKEN_KEY, "tok")]));
        assert!(!store.restore().unwrap());
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert_eq!(store.storage().get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_restore_corrupt_user_is_wiped() {
        let mut store = SessionStore::new(storage_with(&[(TOKEN_KEY, "tok"), (USER_KEY, "{oops")]));
        assert!(!store.restore().unwrap());
        assert_eq!(store.storage().get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.storage().get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_logout_from_any_state() {
        let user = stored_user();
        let mut store = SessionStore::new(storage_with(&[(TOKEN_KEY, "tok"), (USER_KEY, user.as_str())]));
        store.restore().unwrap();

        assert_eq!(store.logout().unwrap(), Route::Login);
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert_eq!(store.storage().get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.storage().get(USER_KEY).unwrap(), None);

        // Logging out twice is fine
        assert_eq!(store.logout().unwrap(), Route::Login);
    }

    #[test]
    fn test_authorize_syncs_token() {
        let user = stored_user();
        let mut store = SessionStore::new(storage_with(&[(TOKEN_KEY, "tok"), (USER_KEY, user.as_str())]));
        let mut api = ApiClient::new("http://localhost:8000").unwrap();

        store.restore().unwrap();
        store.authorize(&mut api);
        assert_eq!(api.token(), Some("tok"));

        store.logout().unwrap();
        store.authorize(&mut api);
        assert_eq!(api.token(), None);
    }

    #[test]
    fn test_restore_unreadable_file_is_wiped() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let path = storage.path().to_path_buf();
        std::fs::write(&path, r#"{"authToken":"tok","authUser":"#).unwrap();

        let mut store = SessionStore::new(Box::new(storage));
        assert!(!store.restore().unwrap());
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert!(!path.exists());
        assert_eq!(store.storage().get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_overlapping_login_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"access_token": "tok", "token_type": "bearer"}),
            ))
            .expect(0)
            .mount(&server)
            .await;
        let api = ApiClient::new(server.uri()).unwrap();

        let mut store = SessionStore::new(storage_with(&[]));
        store.state = SessionState::Authenticating;

        let credentials = Credentials::new("anna@example.com", "secret");
        assert!(store.login(&api, &credentials).await.is_err());
        assert_eq!(store.state(), SessionState::Authenticating);

        let registration = Registration {
            email: "anna@example.com".to_string(),
            username: "anna".to_string(),
            password: "secret".to_string(),
        };
        assert!(store.register(&api, &registration).await.is_err());
        assert_eq!(store.state(), SessionState::Authenticating);
        assert!(store.is_loading());
        assert_eq!(store.storage().get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Dashboard.path(), "/dashboard");
        assert_eq!(Route::Login.path(), "/auth/login");
    }
}
