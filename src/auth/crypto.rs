//! # Cryptographic Utilities
//!
//! Password hash verification and constant-time comparison.
//!
//! The configured password hash is an Argon2 PHC string
//! (`$argon2id$v=19$...`).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use subtle::ConstantTimeEq;

use super::errors::{AuthError, AuthResult};

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Misconfigured(format!("password hashing failed: {e}")))
}

/// Check that `hash` is a PHC string the verifier can use
pub fn check_hash_format(hash: &str) -> AuthResult<()> {
    parse_hash(hash).map(|_| ())
}

fn parse_hash(hash: &str) -> AuthResult<PasswordHash<'_>> {
    // bcrypt ($2a$, $2b$, $2y$) is not a PHC string
    if hash.starts_with("$2") {
        return Err(AuthError::Misconfigured(
            "password hash is bcrypt; re-hash the password with Argon2id".to_string(),
        ));
    }
    PasswordHash::new(hash)
        .map_err(|_| AuthError::Misconfigured("password hash is not a PHC string".to_string()))
}

/// Verify a password against its hash
///
/// Uses constant-time comparison internally (via argon2 crate).
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash = parse_hash(hash)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Constant-time comparison of two strings
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
