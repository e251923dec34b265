//! HS256 access tokens.
//!
//! Tokens carry `{sub, email, role, iat, exp}` where `sub` is the user id.
//!
//! # Example
//!
//! ```ignore
//! let jwt = JwtService::new("change-me", Duration::days(7))?;
//! let token = jwt.issue(&user)?;
//! let claims = jwt.verify(&token)?;
//! assert_eq!(claims.sub, user.id);
//! ```

use catalogo_core::{Role, User};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Default token lifetime: 7 days.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The signing secret is unusable.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidKeyFormat => Self::invalid_key(err.to_string()),
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

// ============================================================================
// Service
// ============================================================================

/// Issues and verifies HS256 tokens with a shared secret.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Creates a service for `secret`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidKey` if the secret is empty.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::invalid_key("JWT secret must not be empty"));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user` valid for the configured TTL.
    pub fn issue(&self, user: &User) -> Result<String, JwtError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + self.ttl.whole_seconds(),
        };
        self.encode(&claims)
    }

    /// Signs arbitrary claims.
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Checks signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalogo_core::NewUser;

    fn user(role: Role) -> User {
        User::from_new(
            NewUser {
                email: "ana@example.com".into(),
                name: "Ana".into(),
                password_hash: "hash".into(),
                role,
            },
            catalogo_core::now_utc(),
        )
    }

    fn service() -> JwtService {
        JwtService::new("test-secret", Duration::days(7)).unwrap()
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            JwtService::new("", Duration::days(7)),
            Err(JwtError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_issue_and_verify() {
        let jwt = service();
        let user = user(Role::Admin);
        let token = jwt.issue(&user).unwrap();
        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = service();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let token = jwt
            .encode(&Claims {
                sub: "u1".into(),
                email: "a@b.c".into(),
                role: Role::User,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert!(matches!(jwt.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = JwtService::new("other-secret", Duration::days(7)).unwrap();
        let token = other.issue(&user(Role::User)).unwrap();
        assert!(matches!(
            service().verify(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(service().verify("not.a.jwt").is_err());
    }
}
