//! Request-scoped identity.
//!
//! The authentication middleware stores a [`RequestContext`] in the request
//! extensions; handlers read it back through the extractor impl below.
use std::collections::BTreeSet;
use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::storage::Identity;

/// Prefix turning a role name into an authority
pub const ROLE_PREFIX: &str = "ROLE_";

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    /// Always one entry today, modelled as a set so more roles fit later
    pub authorities: BTreeSet<String>,
}

impl Principal {
    pub fn new(username: impl Into<String>, roles: &[&str]) -> Self {
        Self {
            username: username.into(),
            authorities: roles.iter().map(|r| authority_for(r)).collect(),
        }
    }

    pub fn from_identity(identity: &Identity) -> Self {
        Self::new(identity.username.clone(), &[identity.role.name.as_str()])
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

/// `USER` -> `ROLE_USER`
pub fn authority_for(role: &str) -> String {
    format!("{ROLE_PREFIX}{role}")
}

/// Per-request security context, passed explicitly instead of living in global state
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    principal: Option<Principal>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// The principal, or `Unauthenticated` for anonymous requests
    pub fn require(&self) -> Result<&Principal, AppError> {
        self.principal.as_ref().ok_or(AppError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // routes outside the auth layer see an anonymous context
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}
