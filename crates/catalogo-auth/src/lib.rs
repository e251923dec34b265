//! # catalogo-auth
//!
//! Accounts and access control for the Catalogo server.
//!
//! - [`password`] - Argon2id hashing and verification
//! - [`jwt`] - HS256 token issuing and verification
//! - [`service`] - registration and login
//! - [`middleware`] - axum extractors ([`BearerAuth`], [`AdminAuth`]) and
//!   the JSON error rendering for [`AuthError`]

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use error::AuthError;
pub use jwt::{Claims, DEFAULT_TOKEN_TTL_SECS, JwtError, JwtService};
pub use middleware::{AdminAuth, AuthContext, AuthState, BearerAuth};
pub use password::{hash_password, verify_password};
pub use service::{AuthService, LoginRequest, LoginResponse, RegisterRequest};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::error::AuthError;
    pub use crate::middleware::{AdminAuth, AuthContext, AuthState, BearerAuth};
    pub use crate::service::{AuthService, LoginRequest, LoginResponse, RegisterRequest};
}
