//! Manager credential hashing.
//!
//! Plaintext passwords are hashed with Argon2id and stored as PHC strings
//! (`$argon2id$v=19$...`). Only the PHC string ever reaches storage.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::CrmError;

/// Hashes `password` with a fresh random salt.
///
/// # Errors
///
/// Returns [`CrmError::Validation`] for an empty password and
/// [`CrmError::Internal`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, CrmError> {
    if password.is_empty() {
        return Err(CrmError::validation("password", "must not be empty"));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CrmError::Internal(format!("password hashing failed: {e}")))
}

/// Checks `password` against a stored PHC string.
///
/// # Errors
///
/// Returns [`CrmError::Internal`] if `stored` is not a PHC string.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CrmError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| CrmError::Internal(format!("stored hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let Ok(hash) = hash_password("correct horse") else {
            panic!("hashing failed");
        };
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("correct horse"));
        assert_eq!(verify_password("correct horse", &hash).ok(), Some(true));
        assert_eq!(verify_password("wrong horse", &hash).ok(), Some(false));
    }

    #[test]
    fn salts_differ() {
        let (Ok(a), Ok(b)) = (hash_password("same"), hash_password("same")) else {
            panic!("hashing failed");
        };
        assert_ne!(a, b);
    }

    #[test]
    fn empty_password_rejected() {
        assert!(matches!(
            hash_password(""),
            Err(CrmError::Validation {
                field: "password",
                ..
            })
        ));
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }
}
