//! Password hashing and verification.
//!
//! Passwords are stored as Argon2id PHC strings. The rest of the crate treats
//! the digest as opaque: [`hash_password`] produces it, [`verify_password`]
//! checks a raw password against it, and nothing else inspects its contents.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::{CorkboardError, Result};

/// Hashes a raw password into an Argon2id PHC string with a random salt.
pub fn hash_password(raw: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map_err(|e| CorkboardError::internal(format!("Failed to hash password: {}", e)))?;
    Ok(digest.to_string())
}

/// Verifies a raw password against a stored digest.
///
/// A malformed digest verifies as `false` rather than failing, so a corrupted
/// user record can never be authenticated against.
pub fn verify_password(raw: &str, digest: &str) -> bool {
    let parsed = match PasswordHash::new(digest) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(raw.as_bytes(), &parsed)
        .is_ok()
}
