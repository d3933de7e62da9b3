//! Centralized API error handling
//!
//! Maps service errors to HTTP status codes and the `{ ok: false, error }`
//! JSON body clients expect.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

/// Message shown to clients for any server-side fault
pub const SERVER_ERROR_MESSAGE: &str = "server error";

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to send to the client. Internal details never leave the server.
    pub fn public_message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) => msg,
            ApiError::InternalError(_) => SERVER_ERROR_MESSAGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        match &self {
            ApiError::InternalError(detail) => {
                tracing::error!(error = %detail, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %self, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            ok: false,
            error: self.public_message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInput(msg) => ApiError::BadRequest(msg),
            AuthError::MissingFields | AuthError::InvalidNonce => {
                ApiError::BadRequest(err.to_string())
            }
            AuthError::InvalidSignature => ApiError::Unauthorized(err.to_string()),
            AuthError::Internal(detail) => ApiError::InternalError(detail),
        }
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InternalError("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        let cases = [
            (AuthError::MissingFields, StatusCode::BAD_REQUEST, "Missing Fields"),
            (AuthError::InvalidNonce, StatusCode::BAD_REQUEST, "Invalid Nonce"),
            (
                AuthError::InvalidInput("Address is Required".to_string()),
                StatusCode::BAD_REQUEST,
                "Address is Required",
            ),
            (
                AuthError::InvalidSignature,
                StatusCode::UNAUTHORIZED,
                "Invalid Signature",
            ),
        ];

        for (auth_error, status, message) in cases {
            let api_error = ApiError::from(auth_error);
            assert_eq!(api_error.status_code(), status);
            assert_eq!(api_error.public_message(), message);
        }
    }

    #[test]
    fn test_internal_detail_is_not_public() {
        let api_error = ApiError::from(AuthError::Internal("db password wrong".to_string()));

        assert_eq!(api_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.public_message(), SERVER_ERROR_MESSAGE);
        assert!(api_error.to_string().contains("db password wrong"));
    }
}
