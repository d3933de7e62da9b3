//! CORS policy
//!
//! The session travels in a cookie, so cross-origin callers must be named
//! explicitly: credentials cannot be combined with a wildcard origin.

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        tracing::warn!("No valid CORS origins configured, cross-origin requests will be refused");
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
