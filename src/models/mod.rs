//! Data models for the Web3 login server

pub mod auth;

pub use auth::*;
