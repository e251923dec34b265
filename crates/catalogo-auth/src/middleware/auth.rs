//! Bearer token authentication extractor.
//!
//! # Example
//!
//! ```ignore
//! async fn me(BearerAuth(auth): BearerAuth) -> Json<UserView> {
//!     Json(auth.user.view())
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use catalogo_core::User;
use catalogo_storage::DynUserStorage;

use crate::error::AuthError;
use crate::jwt::{Claims, JwtService};

// =============================================================================
// Auth State
// =============================================================================

/// State required by [`BearerAuth`] and [`super::AdminAuth`].
///
/// Include it in the application state and expose it through `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_service: Arc<JwtService>,
    pub user_storage: DynUserStorage,
}

impl AuthState {
    pub fn new(jwt_service: Arc<JwtService>, user_storage: DynUserStorage) -> Self {
        Self {
            jwt_service,
            user_storage,
        }
    }
}

/// Authenticated caller: the stored account plus the verified claims.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub claims: Claims,
}

// =============================================================================
// Bearer Auth Extractor
// =============================================================================

/// Validates `Authorization: Bearer <token>` and loads the account.
///
/// The role is taken from storage, not from the token, so a demotion takes
/// effect immediately. Every failure, including a storage failure during the
/// lookup, rejects with `AuthError::Unauthorized`.
pub struct BearerAuth(pub AuthContext);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let token = bearer_token(parts).ok_or_else(|| {
            tracing::debug!("missing or malformed Authorization header");
            AuthError::Unauthorized
        })?;

        let claims = auth_state.jwt_service.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::Unauthorized
        })?;

        let user = match auth_state.user_storage.find_by_id(&claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!(sub = %claims.sub, "token subject no longer exists");
                return Err(AuthError::Unauthorized);
            }
            Err(e) => {
                tracing::error!(error = %e, "user lookup failed during authentication");
                return Err(AuthError::Unauthorized);
            }
        };

        Ok(BearerAuth(AuthContext { user, claims }))
    }
}

/// Extracts the token from an `Authorization: Bearer` header. The scheme
/// is matched case-insensitively.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
