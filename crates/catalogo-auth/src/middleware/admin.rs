//! Admin authentication extractor.
//!
//! ```ignore
//! async fn create(AdminAuth(admin): AdminAuth, Json(body): Json<VehiclePatch>) { ... }
//! ```

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use catalogo_core::User;

use crate::error::AuthError;

use super::auth::{AuthState, BearerAuth};

/// Requires a valid bearer token whose stored account has the admin role.
///
/// Authentication failures reject with 401, a non-admin caller with 403.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub User);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerAuth(auth) = BearerAuth::from_request_parts(parts, state).await?;

        if !auth.user.role.is_admin() {
            tracing::debug!(user_id = %auth.user.id, "admin access denied");
            return Err(AuthError::Forbidden);
        }

        Ok(AdminAuth(auth.user))
    }
}
