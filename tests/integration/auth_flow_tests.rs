//! Register, login and session lifecycle through the full router

use axum::http::StatusCode;
use loginsec_backend_lib::{auth::RefreshTokenStore, handlers::session::REGISTERED_MESSAGE};
use loginsec_common::{ErrorResponse, InfoResponse, TokenResponse};

use crate::test_utils::{
    get_with_bearer, login, post_empty, post_with_bearer, register, send, setup_test_env,
};

#[tokio::test]
async fn test_register_login_info() {
    let env = setup_test_env().await;

    let registered = register(&env.app, "alice", "USER").await;
    assert_eq!(registered.status, StatusCode::OK);
    assert_eq!(registered.text(), REGISTERED_MESSAGE);

    let logged_in = login(&env.app, "alice", "pw").await;
    assert_eq!(logged_in.status, StatusCode::OK);
    let refresh = logged_in.refresh_cookie().expect("login should set the refresh cookie");
    let cookie = logged_in.set_cookie().unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));

    let token: TokenResponse = logged_in.json();
    assert!(!token.token.is_empty());
    assert_ne!(token.token, refresh);

    // the cookie value is exactly what the store holds
    let stored = env.store.get("alice").await.unwrap();
    assert_eq!(stored.as_deref(), Some(refresh.as_str()));

    let info = send(&env.app, get_with_bearer("/info", &token.token)).await;
    assert_eq!(info.status, StatusCode::OK);
    assert_eq!(
        info.json::<InfoResponse>(),
        InfoResponse {
            username: "alice".to_string(),
            role: vec!["ROLE_USER".to_string()],
        }
    );
}

#[tokio::test]
async fn test_admin_role_reported() {
    let env = setup_test_env().await;
    register(&env.app, "root", "ADMIN").await;

    let token: TokenResponse = login(&env.app, "root", "pw").await.json();
    let info: InfoResponse = send(&env.app, get_with_bearer("/info", &token.token))
        .await
        .json();
    assert_eq!(info.role, vec!["ROLE_ADMIN".to_string()]);
}

#[tokio::test]
async fn test_failed_login_writes_nothing() {
    let env = setup_test_env().await;
    register(&env.app, "alice", "USER").await;

    let response = login(&env.app, "alice", "wrong").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.set_cookie().is_none());
    assert!(env.store.is_empty());
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_look_the_same() {
    let env = setup_test_env().await;
    register(&env.app, "alice", "USER").await;

    let wrong_password = login(&env.app, "alice", "nope").await;
    let unknown_user = login(&env.app, "mallory", "nope").await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_user.body);

    let body: ErrorResponse = unknown_user.json();
    assert_eq!(body.error, "Invalid username or password");
    assert_eq!(body.code.as_deref(), Some("AUTH_001"));
}

#[tokio::test]
async fn test_second_login_replaces_refresh_token() {
    let env = setup_test_env().await;
    register(&env.app, "alice", "USER").await;

    let first = login(&env.app, "alice", "pw").await.refresh_cookie().unwrap();
    let second = login(&env.app, "alice", "pw").await.refresh_cookie().unwrap();
    assert_ne!(first, second);

    let stored = env.store.get("alice").await.unwrap();
    assert_eq!(stored.as_deref(), Some(second.as_str()));
}

#[tokio::test]
async fn test_register_rejects_unknown_role() {
    let env = setup_test_env().await;

    let response = register(&env.app, "alice", "ROOT").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<ErrorResponse>().code.as_deref(),
        Some("VAL_001")
    );

    // nothing was created
    let response = login(&env.app, "alice", "pw").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let env = setup_test_env().await;
    assert_eq!(register(&env.app, "alice", "USER").await.status, StatusCode::OK);

    let response = register(&env.app, "alice", "ADMIN").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(
        response.json::<ErrorResponse>().code.as_deref(),
        Some("USER_001")
    );

    // the original identity is untouched
    let token: TokenResponse = login(&env.app, "alice", "pw").await.json();
    let info: InfoResponse = send(&env.app, get_with_bearer("/info", &token.token))
        .await
        .json();
    assert_eq!(info.role, vec!["ROLE_USER".to_string()]);
}

#[tokio::test]
async fn test_register_rejects_path_like_username() {
    let env = setup_test_env().await;

    let response = register(&env.app, "../escape", "USER").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!env.temp_dir.path().join("escape.json").exists());
}

#[tokio::test]
async fn test_password_stored_hashed() {
    let env = setup_test_env().await;
    register(&env.app, "alice", "USER").await;

    let path = env.temp_dir.path().join("users").join("alice.json");
    let content = std::fs::read_to_string(path).unwrap();
    let record: serde_json::Value = serde_json::from_str(&content).unwrap();

    let hash = record["password_hash"].as_str().unwrap();
    assert_ne!(hash, "pw");
    assert!(hash.starts_with("$scrypt$"));
}

#[tokio::test]
async fn test_logout_deletes_refresh_token() {
    let env = setup_test_env().await;
    register(&env.app, "alice", "USER").await;
    let token: TokenResponse = login(&env.app, "alice", "pw").await.json();
    assert!(!env.store.is_empty());

    let response = send(&env.app, post_with_bearer("/logout", &token.token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "success");
    assert!(response.clears_refresh_cookie());
    assert_eq!(env.store.get("alice").await.unwrap(), None);

    // idempotent
    let again = send(&env.app, post_with_bearer("/logout", &token.token)).await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.text(), "success");
    assert!(again.clears_refresh_cookie());
    assert_eq!(env.store.get("alice").await.unwrap(), None);
}

#[tokio::test]
async fn test_anonymous_logout_is_a_noop() {
    let env = setup_test_env().await;
    register(&env.app, "alice", "USER").await;
    login(&env.app, "alice", "pw").await;

    let response = send(&env.app, post_empty("/logout")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(env.store.get("alice").await.unwrap().is_some());
}
