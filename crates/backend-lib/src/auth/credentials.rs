//! Credential verification against the identity store.
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::password::{hash_password, verify_password, HashCost};
use crate::error::{with_timeout, AppError};
use crate::storage::IdentityStore;

/// Outcome of a successful credential check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub username: String,
    pub role: String,
}

/// Checks a username/password pair against stored identities
#[derive(Clone)]
pub struct CredentialVerifier {
    identities: Arc<dyn IdentityStore>,
    timeout: Duration,
    // verified against when the user does not exist, so both failure paths cost the same
    dummy_hash: Arc<str>,
}

impl CredentialVerifier {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        timeout: Duration,
        cost: HashCost,
    ) -> Result<Self, AppError> {
        let dummy_hash = hash_password("not-a-real-password", cost)?;
        Ok(Self {
            identities,
            timeout,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Returns `Authentication` both for unknown users and wrong passwords
    pub async fn verify(&self, username: &str, password: &str) -> Result<VerifiedUser, AppError> {
        let identity = with_timeout(
            "identity store",
            self.timeout,
            self.identities.find_identity(username),
        )
        .await?;

        let hash = match &identity {
            Some(identity) => identity.password_hash.clone(),
            None => self.dummy_hash.to_string(),
        };

        let plain = password.to_string();
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&hash, &plain)).await?;

        match identity {
            Some(identity) if matches => Ok(VerifiedUser {
                username: identity.username,
                role: identity.role.name,
            }),
            _ => {
                debug!(username, "credential check failed");
                Err(AppError::Authentication)
            },
        }
    }
}
