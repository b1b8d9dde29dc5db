// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use std::future::Future;
use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use loginsec_common::ErrorResponse;
use thiserror::Error;

use crate::validation::ValidationError;

/// Why a token could not be accepted
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Bad structure, bad signature or unexpected algorithm
    #[error("malformed token")]
    Malformed,
    /// Signature is fine but `exp <= now`
    #[error("expired token")]
    Expired,
}

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown user or wrong password. Deliberately carries no detail.
    #[error("Authentication failed")]
    Authentication,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Refresh token is missing")]
    MissingRefreshToken,

    /// The presented refresh token is not the one currently stored for the user
    #[error("Refresh token is stale or was replayed")]
    ReplayOrStaleToken,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Authentication
            | AppError::Token(_)
            | AppError::MissingRefreshToken
            | AppError::ReplayOrStaleToken
            | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UsernameTaken(_) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) | AppError::Io(_) | AppError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Authentication => "AUTH_001",
            AppError::Unauthenticated => "AUTH_002",
            AppError::Token(TokenError::Malformed) => "TOKEN_001",
            AppError::Token(TokenError::Expired) => "TOKEN_002",
            AppError::MissingRefreshToken => "TOKEN_003",
            AppError::ReplayOrStaleToken => "TOKEN_004",
            AppError::Validation(_) => "VAL_001",
            AppError::UsernameTaken(_) => "USER_001",
            AppError::Store(_) => "STORE_001",
            AppError::Timeout(_) => "STORE_002",
            AppError::Internal(_) => "INT_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Authentication => "Invalid username or password".to_string(),
            AppError::Unauthenticated => "Authentication required".to_string(),
            AppError::Token(TokenError::Expired) => "Token has expired".to_string(),
            AppError::Token(TokenError::Malformed) => "Invalid token".to_string(),
            AppError::MissingRefreshToken => "Refresh token is missing".to_string(),
            AppError::ReplayOrStaleToken => "Refresh token is no longer valid".to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::UsernameTaken(_) => "Username is already taken".to_string(),
            AppError::Store(_) | AppError::Timeout(_) => {
                "Service temporarily unavailable".to_string()
            },
            AppError::Internal(_) | AppError::Io(_) => "An internal server error occurred".to_string(),
            AppError::Json(_) => "Invalid request format".to_string(),
        }
    }

    /// True for the failures that mean "the refresh cookie is unusable"
    pub fn is_token_error(&self) -> bool {
        matches!(self, AppError::Token(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Use detailed messages in development, sanitized in production
        let message = match &self {
            // identical text for "no such user" and "wrong password" in every build
            AppError::Authentication => self.sanitized_message(),
            _ if cfg!(debug_assertions) => self.to_string(),
            _ => self.sanitized_message(),
        };

        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{self}");
        }

        let body = ErrorResponse {
            error: message,
            code: Some(self.error_code().to_string()),
        };

        (status, Json(body)).into_response()
    }
}

// malformed body, wrong content type or missing fields
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("worker task failed: {err}"))
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

/// Run a store call with an upper bound on its duration.
pub async fn with_timeout<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(operation)),
    }
}
