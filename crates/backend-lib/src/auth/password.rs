// ============================
// loginsec-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use zeroize::Zeroize;

use crate::error::AppError;

/// Length of the derived key in bytes
const OUTPUT_LEN: usize = 32;

/// scrypt cost used for new hashes. Verification reads the cost from the stored hash.
#[derive(Debug, Clone, Copy)]
pub struct HashCost {
    pub log_n: u8,
}

impl Default for HashCost {
    fn default() -> Self {
        Self { log_n: 15 }
    }
}

impl HashCost {
    fn params(self) -> Result<Params, AppError> {
        Params::new(self.log_n, 8, 1, OUTPUT_LEN)
            .map_err(|e| AppError::Internal(format!("invalid scrypt parameters: {e}")))
    }
}

/// Hash a password using scrypt
pub fn hash_password(plain: &str, cost: HashCost) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, cost.params()?, &salt)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a hash
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// Securely hash a password and zeroize the original
pub fn hash_password_secure(plain: &mut String, cost: HashCost) -> Result<String, AppError> {
    let hash = hash_password(plain, cost);
    plain.zeroize();
    hash
}
