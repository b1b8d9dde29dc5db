//! Refresh cookie helpers.
use std::time::Duration;

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use loginsec_common::REFRESH_COOKIE;

use crate::error::AppError;

/// Value of cookie `name`, looking through every `Cookie` header
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// The presented refresh token, if the cookie is set
pub fn refresh_token(headers: &HeaderMap) -> Option<String> {
    parse_cookie(headers, REFRESH_COOKIE)
}

/// HttpOnly refresh cookie scoped to `/` living as long as the token
pub fn refresh_cookie(token: &str, max_age: Duration, secure: bool) -> Result<HeaderValue, AppError> {
    let value = format!(
        "{REFRESH_COOKIE}={token}; Max-Age={}; Path=/; HttpOnly; SameSite=Strict{}",
        max_age.as_secs(),
        if secure { "; Secure" } else { "" }
    );
    HeaderValue::from_str(&value).map_err(|e| AppError::Internal(format!("invalid cookie value: {e}")))
}

/// Expire the refresh cookie on the client
pub fn clear_refresh_cookie(secure: bool) -> Result<HeaderValue, AppError> {
    refresh_cookie("", Duration::ZERO, secure)
}
