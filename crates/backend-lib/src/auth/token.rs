// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
/** Signed, expiring tokens carrying `{username, role}`.

Access and refresh tokens share one format (HS256 JWT) and one key; they only
differ in lifetime. Validity is a pure function of signature and expiry.

The signing key is loaded once at startup. Key rotation would slot in here by
holding several `DecodingKey`s selected by a `kid` header; it is not
implemented. */
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{TokenSettings, MIN_SECRET_LEN};
use crate::error::{AppError, TokenError};

/// Claims embedded in every token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub username: String,
    pub role: String,
    /// Issued-at, Unix seconds
    pub iat: u64,
    /// Expiry, Unix seconds. The token is expired once `now >= exp`.
    pub exp: u64,
    /// Unique id, so two tokens minted in the same second differ
    pub jti: String,
}

/// Access token plus refresh token minted together
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and validates tokens with a process-wide symmetric key
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

/// Current Unix time in seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl TokenService {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, AppError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Internal(format!(
                "token secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        // Expiry is checked by hand so that `exp == now` counts as expired.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_settings(settings: &TokenSettings) -> Result<Self, AppError> {
        Self::new(
            settings.secret.as_bytes(),
            settings.access_ttl(),
            settings.refresh_ttl(),
        )
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a token valid for `lifetime` from now
    pub fn issue(&self, username: &str, role: &str, lifetime: Duration) -> Result<String, AppError> {
        self.issue_at(username, role, lifetime, unix_now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        username: &str,
        role: &str,
        lifetime: Duration,
        now: u64,
    ) -> Result<String, AppError> {
        if lifetime.is_zero() {
            return Err(AppError::Internal("token lifetime must be positive".to_string()));
        }
        // claims carry whole seconds; round up so a token never lives shorter than asked
        let lifetime_secs = lifetime.as_secs() + u64::from(lifetime.subsec_nanos() > 0);

        let claims = Claims {
            username: username.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now.saturating_add(lifetime_secs),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token encoding failed: {e}")))
    }

    /// Mint a fresh access/refresh pair with the configured lifetimes
    pub fn issue_pair(&self, username: &str, role: &str) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue(username, role, self.access_ttl)?,
            refresh_token: self.issue(username, role, self.refresh_ttl)?,
        })
    }

    /// Check signature and expiry and return the claims
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, unix_now())
    }

    /// Validate as if the current time were `now`
    pub fn validate_at(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Malformed)?;

        if data.claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }

    /// `Ok(true)` if the token is correctly signed but expired.
    /// Signature and structure failures are returned as `Err(Malformed)`.
    pub fn is_expired(&self, token: &str) -> Result<bool, TokenError> {
        match self.validate(token) {
            Ok(_) => Ok(false),
            Err(TokenError::Expired) => Ok(true),
            Err(e) => Err(e),
        }
    }

    pub fn extract_username(&self, token: &str) -> Result<String, TokenError> {
        self.validate(token).map(|c| c.username)
    }

    pub fn extract_role(&self, token: &str) -> Result<String, TokenError> {
        self.validate(token).map(|c| c.role)
    }
}
