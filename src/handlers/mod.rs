//! API handlers for the Web3 login server

pub mod auth;
pub mod meta;

pub use auth::{request_nonce, verify_login};
pub use meta::{health_check, not_found, root, ROUTES};
