//! Request handlers.

pub mod cookie;
pub mod extract;
pub mod session;

pub use extract::AppJson;
pub use session::{health, info, login, logout, register, reissue};
