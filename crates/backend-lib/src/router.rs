// ============================
// loginsec-backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::authenticate;
use crate::AppState;

/// Create the router with every session endpoint behind the authentication stage
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/reissue", post(handlers::reissue))
        .route("/register", post(handlers::register))
        .route("/info", get(handlers::info))
        .route("/logout", post(handlers::logout))
        .route("/health", get(handlers::health))
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
