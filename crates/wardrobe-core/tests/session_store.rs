//! Session store transitions against a mock token endpoint.

use serde_json::json;
use wardrobe_core::api::{ApiClient, ApiError};
use wardrobe_core::auth::{
    FileStorage, MemoryStorage, Route, SessionState, SessionStorage, SessionStore, TOKEN_KEY,
    USER_KEY,
};
use wardrobe_core::models::{Credentials, Registration};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn token_endpoint(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

fn credentials() -> Credentials {
    Credentials::new("anna@example.com", "secret")
}

#[tokio::test]
async fn test_login_success_persists_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(body_string("username=anna%40example.com&password=secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-123", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri()).unwrap();
    let mut store = SessionStore::new(Box::new(MemoryStorage::new()));

    let route = store.login(&api, &credentials()).await.unwrap();
    assert_eq!(route, Route::Dashboard);
    assert_eq!(store.state(), SessionState::Authenticated);
    assert!(!store.is_loading());
    assert_eq!(store.token(), Some("tok-123"));
    assert_eq!(store.storage().get(TOKEN_KEY).unwrap().as_deref(), Some("tok-123"));

    let user = store.user().unwrap();
    assert_eq!(user.email, "anna@example.com");
    assert_eq!(user.username, "anna");
    let stored_user = store.storage().get(USER_KEY).unwrap().unwrap();
    assert!(stored_user.contains("anna@example.com"));
}

#[tokio::test]
async fn test_failed_login_leaves_no_token() {
    let server = MockServer::start().await;
    token_endpoint(&server, 401, json!({"detail": "Incorrect username or password"})).await;

    let api = ApiClient::new(server.uri()).unwrap();
    let mut storage = MemoryStorage::new();
    // Leftovers from an earlier session must not survive a failed login
    storage.set(TOKEN_KEY, "stale").unwrap();
    let mut store = SessionStore::new(Box::new(storage));

    let err = store.login(&api, &credentials()).await.unwrap_err();
    let api_err = err.downcast_ref::<ApiError>().expect("expected an API error");
    assert!(api_err.is_unauthorized());
    assert_eq!(err.to_string(), "Incorrect username or password");

    assert_eq!(store.state(), SessionState::Unauthenticated);
    assert_eq!(store.token(), None);
    assert_eq!(store.storage().get(TOKEN_KEY).unwrap(), None);
    assert_eq!(store.storage().get(USER_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_empty_access_token_is_a_failure() {
    let server = MockServer::start().await;
    token_endpoint(&server, 200, json!({"access_token": "", "token_type": "bearer"})).await;

    let api = ApiClient::new(server.uri()).unwrap();
    let mut store = SessionStore::new(Box::new(MemoryStorage::new()));

    assert!(store.login(&api, &credentials()).await.is_err());
    assert_eq!(store.state(), SessionState::Unauthenticated);
    assert_eq!(store.storage().get(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_logout_after_login_clears_everything() {
    let server = MockServer::start().await;
    token_endpoint(&server, 200, json!({"access_token": "tok-123", "token_type": "bearer"})).await;

    let api = ApiClient::new(server.uri()).unwrap();
    let mut store = SessionStore::new(Box::new(MemoryStorage::new()));
    store.login(&api, &credentials()).await.unwrap();

    assert_eq!(store.logout().unwrap(), Route::Login);
    assert_eq!(store.state(), SessionState::Unauthenticated);
    assert_eq!(store.storage().get(TOKEN_KEY).unwrap(), None);
    assert_eq!(store.storage().get(USER_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_restore_after_restart_matches_login_session() {
    let server = MockServer::start().await;
    token_endpoint(&server, 200, json!({"access_token": "tok-123", "token_type": "bearer"})).await;

    let dir = tempfile::tempdir().unwrap();
    let api = ApiClient::new(server.uri()).unwrap();
    let mut store = SessionStore::new(Box::new(FileStorage::new(dir.path())));
    store.login(&api, &credentials()).await.unwrap();
    let before = store.data().cloned().unwrap();
    let calls_after_login = server.received_requests().await.unwrap().len();

    // Fresh process: new store over the same directory
    let mut reloaded = SessionStore::new(Box::new(FileStorage::new(dir.path())));
    assert!(reloaded.restore().unwrap());
    assert_eq!(reloaded.state(), SessionState::Authenticated);
    assert_eq!(reloaded.data(), Some(&before));
    assert_eq!(server.received_requests().await.unwrap().len(), calls_after_login);
}

#[tokio::test]
async fn test_restore_from_handed_over_storage() {
    let server = MockServer::start().await;
    token_endpoint(&server, 200, json!({"access_token": "tok-9", "token_type": "bearer"})).await;

    let api = ApiClient::new(server.uri()).unwrap();
    let mut store = SessionStore::new(Box::new(MemoryStorage::new()));
    store.login(&api, &credentials()).await.unwrap();
    let before = store.data().cloned();

    let mut reloaded = SessionStore::new(store.into_storage());
    assert!(reloaded.restore().unwrap());
    assert_eq!(reloaded.data().cloned(), before);
}

#[tokio::test]
async fn test_register_does_not_authenticate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "email": "anna@example.com",
            "username": "anna",
            "is_active": true,
            "created_at": "2025-03-01T12:30:00",
            "updated_at": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri()).unwrap();
    let mut store = SessionStore::new(Box::new(MemoryStorage::new()));
    let registration = Registration {
        email: "anna@example.com".to_string(),
        username: "anna".to_string(),
        password: "secret".to_string(),
    };

    let (user, route) = store.register(&api, &registration).await.unwrap();
    assert_eq!(user.id, 42);
    assert_eq!(route, Route::Login);
    assert_eq!(store.state(), SessionState::Unauthenticated);
    assert_eq!(store.storage().get(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_register_failure_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Email already registered"})),
        )
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri()).unwrap();
    let mut store = SessionStore::new(Box::new(MemoryStorage::new()));
    let registration = Registration {
        email: "anna@example.com".to_string(),
        username: "anna".to_string(),
        password: "secret".to_string(),
    };

    let err = store.register(&api, &registration).await.unwrap_err();
    assert_eq!(err.to_string(), "Email already registered");
    assert_eq!(store.state(), SessionState::Unauthenticated);
}
