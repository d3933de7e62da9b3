//! Route definitions for the Web3 login API

mod auth;

pub use auth::auth_routes;

use axum::{middleware::from_fn, routing::get, Router};

use crate::config::Config;
use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Assemble the full application: routes, fallback and middleware stack.
pub fn create_router(state: AppState, config: &Config) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::root).fallback(handlers::not_found))
        .route("/health", get(handlers::health_check).fallback(handlers::not_found))
        .merge(auth_routes())
        .fallback(handlers::not_found)
        .with_state(state);

    for header in middleware::security_headers() {
        router = router.layer(middleware::header_layer(header));
    }
    if config.environment.is_production() {
        router = router.layer(middleware::header_layer(middleware::hsts_header()));
    }

    router
        .layer(from_fn(middleware::request_tracing))
        .layer(middleware::cors_layer(&config.cors_allowed_origins))
}
