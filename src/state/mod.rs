//! Application state shared across handlers

use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::Environment;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub environment: Environment,
    pub session_cookie_secure: bool,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        environment: Environment,
        session_cookie_secure: bool,
    ) -> Self {
        Self {
            auth_service,
            environment,
            session_cookie_secure,
        }
    }
}
