//! # Credentials
//!
//! The single identity allowed to sign in, and the check against it.

use base64::Engine;
use tracing::warn;

use super::crypto::{check_hash_format, constant_time_str_eq, verify_password};
use super::errors::{AuthError, AuthResult};

/// The allowed email and its password hash
#[derive(Clone)]
pub struct Credentials {
    allowed_email: String,
    password_hash: String,
}

impl Credentials {
    /// Build credentials; the email is compared trimmed and lowercased
    pub fn new(allowed_email: &str, password_hash: &str) -> AuthResult<Self> {
        let allowed_email = normalize_email(allowed_email);
        if allowed_email.is_empty() {
            return Err(AuthError::Misconfigured("allowed email is empty".to_string()));
        }

        let password_hash = password_hash.trim().to_string();
        check_hash_format(&password_hash)?;

        Ok(Self {
            allowed_email,
            password_hash,
        })
    }

    /// Build credentials from a plain hash, or a base64-encoded one when
    /// the plain hash is absent
    pub fn from_settings(
        allowed_email: &str,
        password_hash: Option<&str>,
        password_hash_b64: Option<&str>,
    ) -> AuthResult<Self> {
        let hash = match (password_hash, password_hash_b64) {
            (Some(hash), _) if !hash.trim().is_empty() => hash.to_string(),
            (_, Some(encoded)) => decode_hash(encoded)?,
            _ => return Err(AuthError::Misconfigured("password hash is not set".to_string())),
        };
        Self::new(allowed_email, &hash)
    }

    /// The allowed identity, normalized
    pub fn allowed_email(&self) -> &str {
        &self.allowed_email
    }

    /// Whether `email` names the allowed identity
    pub fn is_allowed(&self, email: &str) -> bool {
        constant_time_str_eq(&normalize_email(email), &self.allowed_email)
    }

    /// Check an email/password pair; returns the normalized email
    pub fn verify(&self, email: &str, password: &str) -> AuthResult<String> {
        if email.trim().is_empty() || password.is_empty() {
            warn!("sign-in rejected: email or password missing");
            return Err(AuthError::InvalidCredentials);
        }

        let email_ok = self.is_allowed(email);
        let password_ok = verify_password(password, &self.password_hash)?;

        if !email_ok {
            warn!("sign-in rejected: identity not allowed");
            return Err(AuthError::InvalidCredentials);
        }
        if !password_ok {
            warn!("sign-in rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.allowed_email.clone())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("allowed_email", &self.allowed_email)
            .finish_non_exhaustive()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn decode_hash(encoded: &str) -> AuthResult<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::Misconfigured("base64 password hash does not decode".to_string()))?;
    String::from_utf8(bytes)
        .map(|s| s.trim().to_string())
        .map_err(|_| AuthError::Misconfigured("base64 password hash is not UTF-8".to_string()))
}
