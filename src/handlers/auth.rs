//! Authentication HTTP handlers
//!
//! Endpoints for the wallet sign-in flow.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::{ApiError, ApiResult};
use crate::models::{NonceChallenge, NonceQuery, VerifyRequest, VerifyResponse};
use crate::state::AppState;

/// GET /auth/nonce?address=0x... - Issue a nonce for the address
pub async fn request_nonce(
    State(state): State<AppState>,
    query: Result<Query<NonceQuery>, QueryRejection>,
) -> ApiResult<Json<NonceChallenge>> {
    let Query(query) = query.map_err(|e| {
        tracing::debug!(error = %e, "Unparseable nonce query");
        ApiError::BadRequest("Address is Required".to_string())
    })?;

    let challenge = state
        .auth_service
        .request_nonce(query.address.as_deref())
        .await?;

    Ok(Json(challenge))
}

/// POST /auth/verify - Verify the signed message and set the session cookie
pub async fn verify_login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<VerifyResponse>)> {
    let Json(req) = body.map_err(|e| {
        tracing::debug!(error = %e, "Unparseable verify body");
        ApiError::BadRequest("Invalid Request Body".to_string())
    })?;

    let session = state
        .auth_service
        .verify_login(
            req.address.as_deref().unwrap_or_default(),
            req.message.as_deref().unwrap_or_default(),
            req.signature.as_deref().unwrap_or_default(),
        )
        .await?;

    let jar = jar.add(session.to_cookie(state.session_cookie_secure));

    Ok((jar, Json(VerifyResponse { ok: true })))
}
