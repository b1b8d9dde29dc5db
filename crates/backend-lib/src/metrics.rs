// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const LOGIN_SUCCEEDED: &str = "auth.login.succeeded";
pub const LOGIN_FAILED: &str = "auth.login.failed";
pub const TOKEN_REISSUED: &str = "auth.token.reissued";
pub const REISSUE_REJECTED: &str = "auth.reissue.rejected";
pub const LOGOUT: &str = "auth.logout";
pub const REGISTERED: &str = "auth.registered";
pub const ANONYMOUS_REQUEST: &str = "auth.filter.anonymous";
