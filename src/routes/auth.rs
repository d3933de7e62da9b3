//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{auth, not_found};
use crate::state::AppState;

/// Create authentication routes
///
/// A known path hit with the wrong method is answered like an unknown path.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/nonce", get(auth::request_nonce).fallback(not_found))
        .route("/auth/verify", post(auth::verify_login).fallback(not_found))
}
