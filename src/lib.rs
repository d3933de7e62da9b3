//! Web3 Login Server Library
//!
//! Sign-in with an EVM wallet: the server issues a single-use nonce per
//! address, the wallet signs a message embedding it, and a verified signature
//! opens a cookie session.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
