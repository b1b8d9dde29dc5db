// ============================
// loginsec-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod credentials;
pub mod password;
pub mod principal;
pub mod refresh_store;
pub mod token;
mod service;
mod service_impl;

pub use credentials::{CredentialVerifier, VerifiedUser};
pub use password::{hash_password, hash_password_secure, verify_password, HashCost};
pub use principal::{authority_for, Principal, RequestContext, ROLE_PREFIX};
pub use refresh_store::{MemoryRefreshStore, RedisRefreshStore, RefreshTokenStore};
pub use service::{AuthService, IssuedTokens};
pub use service_impl::DefaultAuth;
pub use token::{Claims, TokenPair, TokenService};
