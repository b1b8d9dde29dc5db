// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation for registration and login payloads.

use loginsec_common::RegisterRequest;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const MAX_USERNAME_LENGTH: usize = 64;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_AGE: u32 = 150;

// Usernames double as file names and cache keys; no leading dot, no separators.
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_@-][A-Za-z0-9_.@-]*$").unwrap());
static ROLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,31}$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid age: {0}")]
    InvalidAge(u32),

    #[error("Invalid role name: {0}")]
    InvalidRole(String),

    #[error("Role does not exist: {0}")]
    UnknownRole(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if username.is_empty() || username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "must be between 1 and {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "may only contain letters, digits and _ . @ - and must not start with a dot".to_string(),
        ));
    }
    Ok(username)
}

/// Validate a plaintext password before hashing
pub fn validate_password(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::InvalidPassword("must not be empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(password)
}

/// Validate a role name
pub fn validate_role_name(role: &str) -> ValidationResult<&str> {
    if ROLE_REGEX.is_match(role) {
        Ok(role)
    } else {
        Err(ValidationError::InvalidRole(role.to_string()))
    }
}

/// Validate a whole registration request
pub fn validate_register_request(req: &RegisterRequest) -> ValidationResult<()> {
    validate_username(&req.username)?;
    validate_password(&req.password)?;
    validate_role_name(&req.role)?;
    if req.age > MAX_AGE {
        return Err(ValidationError::InvalidAge(req.age));
    }
    Ok(())
}
