use std::time::Duration;

use async_trait::async_trait;
use loginsec_common::RegisterRequest;

use super::Principal;
use crate::error::AppError;

/// Tokens handed back to the client after login or reissue
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// Returned in the response body
    pub access_token: String,
    /// Set as the refresh cookie
    pub refresh_token: String,
    /// Cookie max-age
    pub refresh_ttl: Duration,
}

/// Session protocols: login, silent refresh, logout and registration
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials, mint a token pair and remember the refresh token
    async fn login(&self, username: &str, password: &str) -> Result<IssuedTokens, AppError>;

    /// Exchange the currently stored refresh token for a new pair
    async fn reissue(&self, refresh_token: Option<&str>) -> Result<IssuedTokens, AppError>;

    /// Forget the refresh token of `principal`; a no-op for anonymous callers
    async fn logout(&self, principal: Option<&Principal>) -> Result<(), AppError>;

    /// Create a new identity with an existing role
    async fn register(&self, request: RegisterRequest) -> Result<(), AppError>;
}
