// ============================
// crates/backend-lib/src/handlers/session.rs
// ============================
//! HTTP handlers for the session endpoints.
//!
//! Each handler translates between HTTP (JSON bodies, the refresh cookie,
//! the request context) and the [`AuthService`](crate::auth::AuthService).
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use loginsec_common::{InfoResponse, LoginRequest, RegisterRequest, TokenResponse};
use tracing::debug;

use super::{cookie, AppJson};
use crate::auth::{IssuedTokens, RequestContext};
use crate::error::AppError;
use crate::AppState;

/// Body of a successful registration
pub const REGISTERED_MESSAGE: &str = "Registration completed successfully";

/// Body of a logout response
pub const LOGOUT_MESSAGE: &str = "success";

fn token_response(state: &AppState, issued: IssuedTokens) -> Result<Response, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        cookie::refresh_cookie(
            &issued.refresh_token,
            issued.refresh_ttl,
            state.settings.token.cookie_secure,
        )?,
    );
    Ok((
        headers,
        Json(TokenResponse {
            token: issued.access_token,
        }),
    )
        .into_response())
}

/// `POST /login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Response, AppError> {
    debug!(username = %req.username, "login requested");
    let issued = state.auth.login(&req.username, &req.password).await?;
    token_response(&state, issued)
}

/// `POST /reissue`
pub async fn reissue(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let presented = cookie::refresh_token(&headers);

    let result = match state.auth.reissue(presented.as_deref()).await {
        Ok(issued) => token_response(&state, issued),
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => response,
        // an expired or forged cookie is useless; make the client drop it
        Err(e) if e.is_token_error() => {
            let clear = cookie::clear_refresh_cookie(state.settings.token.cookie_secure);
            let mut response = e.into_response();
            if let Ok(clear) = clear {
                response.headers_mut().insert(SET_COOKIE, clear);
            }
            response
        },
        Err(e) => e.into_response(),
    }
}

/// `POST /register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<&'static str, AppError> {
    debug!(username = %req.username, role = %req.role, "registration requested");
    state.auth.register(req).await?;
    Ok(REGISTERED_MESSAGE)
}

/// `GET /info`
pub async fn info(context: RequestContext) -> Result<Json<InfoResponse>, AppError> {
    let principal = context.require()?;
    Ok(Json(InfoResponse {
        username: principal.username.clone(),
        role: principal.authorities.iter().cloned().collect(),
    }))
}

/// `POST /logout`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    context: RequestContext,
) -> Result<Response, AppError> {
    state.auth.logout(context.principal()).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        cookie::clear_refresh_cookie(state.settings.token.cookie_secure)?,
    );
    Ok((headers, LOGOUT_MESSAGE).into_response())
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
