// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between the login backend and its clients.
//! This module defines the JSON request and response bodies of the HTTP API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Body of `POST /login`
#[derive(Serialize, Deserialize, Clone)]
pub struct LoginRequest {
    /// Account name
    pub username: String,
    /// Plaintext password
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /register`
/// # Fields
/// * `username` - Requested account name (must be unique)
/// * `password` - Plaintext password, hashed before it is stored
/// * `age` - Age of the account holder
/// * `role` - Name of an existing role to assign
#[derive(Serialize, Deserialize, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub age: u32,
    pub role: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("age", &self.age)
            .field("role", &self.role)
            .finish()
    }
}

/// Response carrying a freshly minted access token
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// The access token, to be sent back as `Authorization: Bearer <token>`
    pub token: String,
}

/// Response of `GET /info`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InfoResponse {
    /// Name of the authenticated account
    pub username: String,
    /// Granted authorities, e.g. `["ROLE_USER"]`
    pub role: Vec<String>,
}

/// Error body returned by every failing endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human readable message
    pub error: String,
    /// Stable machine readable code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
