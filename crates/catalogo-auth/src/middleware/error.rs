//! Error response handling for authentication.
//!
//! Errors render as `{"error": "<message>"}`. Server-side failures are
//! logged and replaced by a generic message.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = error_details(&self);

        let mut response = (status, Json(json!({ "error": message }))).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

/// Returns (HTTP status, client-facing message).
fn error_details(error: &AuthError) -> (StatusCode, String) {
    match error {
        AuthError::Validation { message } => (StatusCode::BAD_REQUEST, message.clone()),
        AuthError::EmailTaken => (StatusCode::BAD_REQUEST, error.to_string()),
        AuthError::InvalidCredentials | AuthError::Unauthorized => {
            (StatusCode::UNAUTHORIZED, error.to_string())
        }
        AuthError::Forbidden => (StatusCode::FORBIDDEN, error.to_string()),
        AuthError::Storage(e) => {
            tracing::error!(error = %e, category = %e.category(), "storage failure during authentication");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
        AuthError::Internal { message } => {
            tracing::error!(error = %message, "authentication internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}
