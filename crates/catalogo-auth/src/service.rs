//! Registration and login.

use std::sync::Arc;

use catalogo_core::{
    NewUser, Role, UserView, normalize_email, validate_name, validate_password,
};
use catalogo_storage::DynUserStorage;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::jwt::JwtService;
use crate::password::{hash_password, verify_dummy, verify_password};

/// Body of `POST /api/auth/register`. Missing fields deserialize as empty
/// and are reported by validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserView,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: DynUserStorage,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(users: DynUserStorage, jwt: Arc<JwtService>) -> Self {
        Self { users, jwt }
    }

    pub fn jwt(&self) -> &Arc<JwtService> {
        &self.jwt
    }

    pub fn users(&self) -> &DynUserStorage {
        &self.users
    }

    /// Validates and stores a new account.
    ///
    /// # Errors
    ///
    /// `AuthError::Validation` for bad fields, `AuthError::EmailTaken` if
    /// the normalized email is registered.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserView, AuthError> {
        let email = normalize_email(&request.email)?;
        let name = validate_name(&request.name)?;
        validate_password(&request.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::internal(format!("hashing task failed: {e}")))??;

        let new_user = NewUser {
            email,
            name,
            password_hash,
            role: request.role.unwrap_or_default(),
        };
        let user = match self.users.create(new_user).await {
            Ok(user) => user,
            Err(e) if e.is_already_exists() => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user.view())
    }

    /// Checks credentials and issues a token.
    ///
    /// Unknown email and wrong password both yield
    /// `AuthError::InvalidCredentials`.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let Ok(email) = normalize_email(&request.email) else {
            return Err(AuthError::InvalidCredentials);
        };
        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::debug!("login rejected: unknown email");
            let password = request.password;
            tokio::task::spawn_blocking(move || verify_dummy(&password))
                .await
                .map_err(|e| AuthError::internal(format!("verification task failed: {e}")))?;
            return Err(AuthError::InvalidCredentials);
        };

        let password = request.password;
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::internal(format!("verification task failed: {e}")))?;

        match verified {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(user_id = %user.id, "login rejected: wrong password");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "stored password hash is malformed");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let token = self.jwt.issue(&user)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            user: user.view(),
            token,
        })
    }
}
