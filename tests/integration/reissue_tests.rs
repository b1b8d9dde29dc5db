//! `/reissue` rotation, replay and cookie handling

use std::time::Duration;

use axum::http::StatusCode;
use loginsec_backend_lib::auth::{token::unix_now, RefreshTokenStore};
use loginsec_common::{ErrorResponse, InfoResponse, TokenResponse};

use crate::test_utils::{
    get_with_bearer, login, post_empty, register, reissue_with_cookie, send, setup_test_env,
};

fn code_of(response: &crate::test_utils::TestResponse) -> Option<String> {
    response.json::<ErrorResponse>().code
}

#[tokio::test]
async fn test_reissue_rotates_tokens() {
    let env = setup_test_env().await;
    register(&env.app, "alice", "USER").await;
    let r1 = login(&env.app, "alice", "pw").await.refresh_cookie().unwrap();

    let response = send(&env.app, reissue_with_cookie(&r1)).await;
    assert_eq!(response.status, StatusCode::OK);
    let r2 = response.refresh_cookie().unwrap();
    assert_ne!(r1, r2);

    let stored = env.store.get("alice").await.unwrap();
    assert_eq!(stored.as_deref(), Some(r2.as_str()));

    // the new access token works
    let token: TokenResponse = response.json();
    let info = send(&env.app, get_with_bearer("/info", &token.token)).await;
    assert_eq!(info.status, StatusCode::OK);
    assert_eq!(info.json::<InfoResponse>().username, "alice");
}

#[tokio::test]
async fn test_replayed_refresh_token_rejected() {
    let env = setup_test_env().await;
    register(&env.app, "alice", "USER").await;
    let r1 = login(&env.app, "alice", "pw").await.refresh_cookie().unwrap();
    let r2 = send(&env.app, reissue_with_cookie(&r1))
        .await
        .refresh_cookie()
        .unwrap();

    let replay = send(&env.app, reissue_with_cookie(&r1)).await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(code_of(&replay).as_deref(), Some("TOKEN_004"));
    assert!(replay.set_cookie().is_none());

    // the rejected replay does not disturb the live session
    let stored = env.store.get("alice").await.unwrap();
    assert_eq!(stored.as_deref(), Some(r2.as_str()));
    assert_eq!(
        send(&env.app, reissue_with_cookie(&r2)).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_reissue_after_logout_rejected() {
    let env = setup_test_env().await;
    register(&env.app, "alice", "USER").await;
    let logged_in = login(&env.app, "alice", "pw").await;
    let refresh = logged_in.refresh_cookie().unwrap();
    let token: TokenResponse = logged_in.json();

    send(
        &env.app,
        crate::test_utils::post_with_bearer("/logout", &token.token),
    )
    .await;

    let response = send(&env.app, reissue_with_cookie(&refresh)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(code_of(&response).as_deref(), Some("TOKEN_004"));
}

#[tokio::test]
async fn test_missing_cookie() {
    let env = setup_test_env().await;

    let response = send(&env.app, post_empty("/reissue")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json();
    assert!(!body.error.is_empty());
    assert_eq!(body.code.as_deref(), Some("TOKEN_003"));
}

#[tokio::test]
async fn test_malformed_cookie_is_cleared() {
    let env = setup_test_env().await;

    let response = send(&env.app, reissue_with_cookie("not-a-token")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(code_of(&response).as_deref(), Some("TOKEN_001"));
    assert!(response.clears_refresh_cookie());
}

#[tokio::test]
async fn test_expired_cookie_is_cleared() {
    let env = setup_test_env().await;
    register(&env.app, "alice", "USER").await;

    let expired = env
        .state
        .tokens
        .issue_at("alice", "USER", Duration::from_secs(60), unix_now() - 120)
        .unwrap();
    env.store
        .put("alice", &expired, Duration::from_secs(60))
        .await
        .unwrap();

    let response = send(&env.app, reissue_with_cookie(&expired)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(code_of(&response).as_deref(), Some("TOKEN_002"));
    assert!(response.clears_refresh_cookie());
}
