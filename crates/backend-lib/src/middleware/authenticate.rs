//! Bearer token authentication stage.
//!
//! Runs once per request before any handler. The stage never rejects: every
//! failure leaves the request anonymous and handlers decide whether that is
//! acceptable. It performs no writes.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tracing::{debug, warn};

use crate::auth::{Principal, RequestContext};
use crate::error::with_timeout;
use crate::metrics as keys;
use crate::AppState;

/// Scheme prefix of the `Authorization` header
pub const BEARER_PREFIX: &str = "Bearer ";

/// Attach a [`RequestContext`] to the request and forward it
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = match bearer_token(request.headers()) {
        Some(token) => resolve_context(&state, &token).await,
        None => RequestContext::anonymous(),
    };

    if !context.is_authenticated() {
        counter!(keys::ANONYMOUS_REQUEST).increment(1);
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}

/// Raw token from `Authorization: Bearer <token>`, if present
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Validate the token and load the identity it names
async fn resolve_context(state: &AppState, token: &str) -> RequestContext {
    let claims = match state.tokens.validate(token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "bearer token rejected, continuing anonymously");
            return RequestContext::anonymous();
        },
    };

    let lookup = with_timeout(
        "identity store",
        state.settings.store_timeout(),
        state.identities.find_identity(&claims.username),
    )
    .await;

    match lookup {
        Ok(Some(identity)) => {
            debug!(username = %identity.username, "request authenticated");
            RequestContext::authenticated(Principal::from_identity(&identity))
        },
        Ok(None) => {
            debug!(username = %claims.username, "token names an unknown identity");
            RequestContext::anonymous()
        },
        Err(e) => {
            warn!(error = %e, "identity lookup failed, continuing anonymously");
            RequestContext::anonymous()
        },
    }
}
