//! Axum extractors for authentication and authorization.

pub mod admin;
pub mod auth;
pub mod error;

pub use admin::AdminAuth;
pub use auth::{AuthContext, AuthState, BearerAuth};
