//! Middleware for the Web3 login API
//!
//! This module provides middleware for request tracing, CORS and security
//! headers.

mod cors;
mod security;
mod tracing;

pub use cors::cors_layer;
pub use security::{header_layer, hsts_header, security_headers};
pub use tracing::request_tracing;
