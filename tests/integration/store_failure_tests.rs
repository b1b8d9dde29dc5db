//! Slow or broken stores: 503 at the endpoints, anonymous in the authentication stage

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{http::StatusCode, Router};
use loginsec_backend_lib::{
    auth::MemoryRefreshStore,
    auth::RefreshTokenStore,
    create_router,
    error::AppError,
    storage::{FlatFileStorage, Identity, IdentityStore, Role},
    AppState,
};
use loginsec_common::ErrorResponse;
use tempfile::TempDir;

use crate::test_utils::{
    get_with_bearer, login, post_with_bearer, register, reissue_with_cookie, send, test_settings,
    TestResponse,
};

/// Identity store that never answers
struct StallingIdentities;

#[async_trait]
impl IdentityStore for StallingIdentities {
    async fn find_identity(&self, _username: &str) -> Result<Option<Identity>, AppError> {
        std::future::pending().await
    }

    async fn insert_identity(&self, _identity: &Identity) -> Result<(), AppError> {
        std::future::pending().await
    }

    async fn find_role(&self, _name: &str) -> Result<Option<Role>, AppError> {
        std::future::pending().await
    }

    async fn ensure_role(&self, _role: &Role) -> Result<(), AppError> {
        std::future::pending().await
    }
}

/// Refresh store whose backend is down
struct BrokenRefreshStore;

#[async_trait]
impl RefreshTokenStore for BrokenRefreshStore {
    async fn put(&self, _username: &str, _token: &str, _ttl: Duration) -> Result<(), AppError> {
        Err(AppError::Store("connection refused".to_string()))
    }

    async fn get(&self, _username: &str) -> Result<Option<String>, AppError> {
        Err(AppError::Store("connection refused".to_string()))
    }

    async fn delete(&self, _username: &str) -> Result<(), AppError> {
        Err(AppError::Store("connection refused".to_string()))
    }
}

fn app_with(
    identities: Arc<dyn IdentityStore>,
    refresh_store: Arc<dyn RefreshTokenStore>,
    temp_dir: &TempDir,
) -> (Arc<AppState>, Router) {
    let mut settings = test_settings(temp_dir);
    settings.store_timeout_ms = 100;
    let state = Arc::new(AppState::new(identities, refresh_store, settings).unwrap());
    let app = create_router(state.clone());
    (state, app)
}

async fn seeded_storage(temp_dir: &TempDir) -> Arc<FlatFileStorage> {
    let storage = FlatFileStorage::new(temp_dir.path()).unwrap();
    storage.seed_roles(["USER"]).await.unwrap();
    Arc::new(storage)
}

fn assert_unavailable(response: &TestResponse, code: &str) {
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<ErrorResponse>().code.as_deref(), Some(code));
}

#[tokio::test]
async fn test_login_times_out_on_stalled_identity_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = MemoryRefreshStore::new();
    let (_, app) = app_with(Arc::new(StallingIdentities), Arc::new(store.clone()), &temp_dir);

    let response = login(&app, "alice", "pw").await;
    assert_unavailable(&response, "STORE_002");
    assert!(response.set_cookie().is_none());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_register_times_out_on_stalled_identity_store() {
    let temp_dir = TempDir::new().unwrap();
    let (_, app) = app_with(
        Arc::new(StallingIdentities),
        Arc::new(MemoryRefreshStore::new()),
        &temp_dir,
    );

    assert_unavailable(&register(&app, "alice", "USER").await, "STORE_002");
}

#[tokio::test]
async fn test_stalled_identity_store_leaves_request_anonymous() {
    let temp_dir = TempDir::new().unwrap();
    let (state, app) = app_with(
        Arc::new(StallingIdentities),
        Arc::new(MemoryRefreshStore::new()),
        &temp_dir,
    );

    let token = state
        .tokens
        .issue("alice", "USER", Duration::from_secs(900))
        .unwrap();
    let response = send(&app, get_with_bearer("/info", &token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<ErrorResponse>().code.as_deref(),
        Some("AUTH_002")
    );
}

#[tokio::test]
async fn test_login_fails_when_refresh_store_is_down() {
    let temp_dir = TempDir::new().unwrap();
    let storage = seeded_storage(&temp_dir).await;
    let (_, app) = app_with(storage, Arc::new(BrokenRefreshStore), &temp_dir);
    assert_eq!(register(&app, "alice", "USER").await.status, StatusCode::OK);

    let response = login(&app, "alice", "pw").await;
    assert_unavailable(&response, "STORE_001");
    assert!(response.set_cookie().is_none());
}

#[tokio::test]
async fn test_reissue_fails_when_refresh_store_is_down() {
    let temp_dir = TempDir::new().unwrap();
    let storage = seeded_storage(&temp_dir).await;
    let (state, app) = app_with(storage, Arc::new(BrokenRefreshStore), &temp_dir);
    register(&app, "alice", "USER").await;

    let refresh = state
        .tokens
        .issue("alice", "USER", Duration::from_secs(3_600))
        .unwrap();
    let response = send(&app, reissue_with_cookie(&refresh)).await;
    assert_unavailable(&response, "STORE_001");
    // the cookie may still be good once the store recovers
    assert!(response.set_cookie().is_none());
}

#[tokio::test]
async fn test_logout_reports_refresh_store_outage() {
    let temp_dir = TempDir::new().unwrap();
    let storage = seeded_storage(&temp_dir).await;
    let (state, app) = app_with(storage, Arc::new(BrokenRefreshStore), &temp_dir);
    register(&app, "alice", "USER").await;

    let access = state
        .tokens
        .issue("alice", "USER", Duration::from_secs(900))
        .unwrap();
    let response = send(&app, post_with_bearer("/logout", &access)).await;
    assert_unavailable(&response, "STORE_001");
}
