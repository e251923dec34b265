//! Authentication and authorization error types.

use catalogo_core::CoreError;
use catalogo_storage::StorageError;

use crate::jwt::JwtError;

/// Errors raised by registration, login and the request extractors.
///
/// Every authentication failure collapses into [`AuthError::Unauthorized`]
/// (and every login failure into [`AuthError::InvalidCredentials`]) so a
/// response never reveals which check failed.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A registration field failed validation.
    #[error("{message}")]
    Validation {
        /// Which rule failed.
        message: String,
    },

    /// The email is already registered.
    #[error("Email already registered")]
    EmailTaken,

    /// Unknown email or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, expired or orphaned bearer token.
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated, but not an admin.
    #[error("Admin access required")]
    Forbidden,

    /// A storage error occurred.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Hashing or token signing failed.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingError { message } | JwtError::InvalidKey { message } => {
                Self::internal(message)
            }
            _ => Self::Unauthorized,
        }
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::internal(format!("password hashing failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(AuthError::EmailTaken.to_string(), "Email already registered");
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid credentials");
        assert_eq!(AuthError::Unauthorized.to_string(), "Authentication required");
        assert_eq!(AuthError::Forbidden.to_string(), "Admin access required");
    }

    #[test]
    fn test_jwt_errors_collapse_to_unauthorized() {
        assert!(matches!(
            AuthError::from(JwtError::Expired),
            AuthError::Unauthorized
        ));
        assert!(matches!(
            AuthError::from(JwtError::InvalidSignature),
            AuthError::Unauthorized
        ));
        assert!(matches!(
            AuthError::from(JwtError::invalid_key("empty")),
            AuthError::Internal { .. }
        ));
    }

    #[test]
    fn test_core_error_is_validation() {
        let err: AuthError = CoreError::invalid_field("email", "is required").into();
        assert_eq!(err.to_string(), "email is required");
        assert!(matches!(err, AuthError::Validation { .. }));
    }
}
