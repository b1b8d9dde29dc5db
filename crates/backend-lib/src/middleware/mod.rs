// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the login backend.

pub mod authenticate;

pub use authenticate::{authenticate, bearer_token, BEARER_PREFIX};
