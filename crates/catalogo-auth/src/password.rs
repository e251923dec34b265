//! Password hashing.
//!
//! Argon2id (hybrid mode) with default parameters and a random salt from
//! `OsRng`; hashes are stored as PHC strings.
//!
//! # Example
//!
//! ```
//! use catalogo_auth::password::{hash_password, verify_password};
//!
//! let hash = hash_password("my_secure_password").unwrap();
//! assert!(hash.starts_with("$argon2id$"));
//! assert!(verify_password("my_secure_password", &hash).unwrap());
//! assert!(!verify_password("wrong_password", &hash).unwrap());
//! ```

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a password for storage using Argon2id.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// `Ok(false)` on mismatch; `Err` only if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("catalogo-dummy-password").ok());

/// Burns one Argon2 verification against a fixed hash.
///
/// Used when there is no stored hash to check, so that rejecting an unknown
/// account costs as much as rejecting a wrong password.
pub fn verify_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("secret123").unwrap();
        let b = hash_password("secret123").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("secret123"));
        assert!(verify_password("secret123", &a).unwrap());
        assert!(verify_password("secret123", &b).unwrap());
    }

    #[test]
    fn test_wrong_password() {
        let hash = hash_password("secret123").unwrap();
        assert!(!verify_password("secret124", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash() {
        assert!(verify_password("secret123", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_dummy_verification_runs_argon2() {
        let hash = DUMMY_HASH.as_deref().expect("dummy hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_password("anything", hash).unwrap());
        verify_dummy("anything");
    }
}
