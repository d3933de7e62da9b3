//! Service information, health and fallback handlers

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::state::AppState;

/// Routes listed by the index and by the 404 fallback
pub const ROUTES: [&str; 4] = [
    "GET /",
    "GET /health",
    "GET /auth/nonce?address=0x...",
    "POST /auth/verify (body: { address, message, signature })",
];

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: &'static str,
    pub routes: Vec<&'static str>,
}

/// GET /
pub async fn root() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Auth server running",
        routes: vec!["GET /auth/nonce", "POST /auth/verify"],
    })
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: &'static str,
    pub outstanding_nonces: Option<usize>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let outstanding = state.auth_service.outstanding_nonces().await;

    let status = if outstanding.is_ok() {
        "healthy"
    } else {
        "unhealthy"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        environment: state.environment.as_str(),
        outstanding_nonces: outstanding.ok(),
    })
}

#[derive(Debug, Serialize)]
pub struct NotFoundResponse {
    pub error: &'static str,
    pub path: String,
    pub routes: Vec<&'static str>,
}

/// Fallback for unknown routes
pub async fn not_found(request: Request) -> impl IntoResponse {
    let path = format!("{} {}", request.method(), request.uri().path());

    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: "Not Found",
            path,
            routes: ROUTES.to_vec(),
        }),
    )
}
