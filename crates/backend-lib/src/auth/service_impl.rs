use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use loginsec_common::RegisterRequest;
use metrics::counter;
use tracing::{info, warn};

use super::{
    hash_password_secure, AuthService, CredentialVerifier, HashCost, IssuedTokens, Principal,
    RefreshTokenStore, TokenService,
};
use crate::error::{with_timeout, AppError};
use crate::metrics as keys;
use crate::storage::{Identity, IdentityStore};
use crate::validation::{validate_register_request, ValidationError};

/// Default session orchestrator wiring the verifier, token service and stores together
pub struct DefaultAuth {
    verifier: CredentialVerifier,
    tokens: Arc<TokenService>,
    refresh_store: Arc<dyn RefreshTokenStore>,
    identities: Arc<dyn IdentityStore>,
    hash_cost: HashCost,
    timeout: Duration,
}

impl DefaultAuth {
    pub fn new(
        tokens: Arc<TokenService>,
        identities: Arc<dyn IdentityStore>,
        refresh_store: Arc<dyn RefreshTokenStore>,
        hash_cost: HashCost,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        Ok(Self {
            verifier: CredentialVerifier::new(identities.clone(), timeout, hash_cost)?,
            tokens,
            refresh_store,
            identities,
            hash_cost,
            timeout,
        })
    }

    /// Mint a pair and make its refresh token the only valid one for the user
    async fn start_session(&self, username: &str, role: &str) -> Result<IssuedTokens, AppError> {
        let pair = self.tokens.issue_pair(username, role)?;
        let ttl = self.tokens.refresh_ttl();

        with_timeout(
            "refresh store",
            self.timeout,
            self.refresh_store.put(username, &pair.refresh_token, ttl),
        )
        .await?;

        Ok(IssuedTokens {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            refresh_ttl: ttl,
        })
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn login(&self, username: &str, password: &str) -> Result<IssuedTokens, AppError> {
        let user = match self.verifier.verify(username, password).await {
            Ok(user) => user,
            Err(e) => {
                counter!(keys::LOGIN_FAILED).increment(1);
                return Err(e);
            },
        };

        let issued = self.start_session(&user.username, &user.role).await?;

        counter!(keys::LOGIN_SUCCEEDED).increment(1);
        info!(username = %user.username, role = %user.role, "login succeeded");
        Ok(issued)
    }

    async fn reissue(&self, refresh_token: Option<&str>) -> Result<IssuedTokens, AppError> {
        let presented = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AppError::MissingRefreshToken)?;

        let claims = self.tokens.validate(presented).map_err(|e| {
            counter!(keys::REISSUE_REJECTED).increment(1);
            warn!(error = %e, "refresh token rejected");
            AppError::Token(e)
        })?;

        let stored = with_timeout(
            "refresh store",
            self.timeout,
            self.refresh_store.get(&claims.username),
        )
        .await?;

        // Existence is not enough: a superseded token is correctly signed and
        // unexpired, only the exact comparison catches its replay.
        if stored.as_deref() != Some(presented) {
            counter!(keys::REISSUE_REJECTED).increment(1);
            warn!(username = %claims.username, "refresh token does not match the stored one");
            return Err(AppError::ReplayOrStaleToken);
        }

        let issued = self.start_session(&claims.username, &claims.role).await?;

        counter!(keys::TOKEN_REISSUED).increment(1);
        info!(username = %claims.username, "tokens reissued");
        Ok(issued)
    }

    async fn logout(&self, principal: Option<&Principal>) -> Result<(), AppError> {
        let Some(principal) = principal else {
            return Ok(());
        };

        with_timeout(
            "refresh store",
            self.timeout,
            self.refresh_store.delete(&principal.username),
        )
        .await?;

        counter!(keys::LOGOUT).increment(1);
        info!(username = %principal.username, "logged out");
        Ok(())
    }

    async fn register(&self, request: RegisterRequest) -> Result<(), AppError> {
        validate_register_request(&request)?;

        let role = with_timeout(
            "identity store",
            self.timeout,
            self.identities.find_role(&request.role),
        )
        .await?
        .ok_or_else(|| ValidationError::UnknownRole(request.role.clone()))?;

        let RegisterRequest {
            username,
            mut password,
            age,
            ..
        } = request;
        let cost = self.hash_cost;
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password_secure(&mut password, cost))
                .await??;

        let identity = Identity {
            username,
            password_hash,
            age,
            role,
        };
        with_timeout(
            "identity store",
            self.timeout,
            self.identities.insert_identity(&identity),
        )
        .await?;

        counter!(keys::REGISTERED).increment(1);
        info!(username = %identity.username, role = %identity.role.name, "identity registered");
        Ok(())
    }
}
