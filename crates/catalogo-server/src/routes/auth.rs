//! Registration and login endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use catalogo_auth::{AuthService, LoginRequest, LoginResponse, RegisterRequest};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// `POST /api/auth/register` → 201 with the public user view.
pub async fn register(
    State(auth): State<AuthService>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /api/auth/login` → `{user, token}`.
pub async fn login(
    State(auth): State<AuthService>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    Ok(Json(auth.login(request).await?))
}
