//! # Auth Errors
//!
//! Error types for sign-in and the session gate.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // ==================
    // Sign-in Errors
    // ==================

    /// Wrong email or password (generic - never says which)
    #[error("Invalid email or password")]
    InvalidCredentials,

    // ==================
    // Session Errors
    // ==================

    /// No session token on the request, or it names another identity
    #[error("Sign-in required")]
    SessionRequired,

    /// Session token has expired
    #[error("Session expired")]
    TokenExpired,

    /// Session token could not be decoded
    #[error("Malformed session token")]
    MalformedToken,

    /// Session token signature does not match
    #[error("Invalid session token signature")]
    InvalidSignature,

    // ==================
    // Internal Errors
    // ==================

    /// Token generation failed
    #[error("Internal error: session token generation failed")]
    TokenGenerationFailed,

    /// Auth settings are missing or unusable
    #[error("Authentication is not configured: {0}")]
    Misconfigured(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 401 Unauthorized
            AuthError::InvalidCredentials => 401,
            AuthError::SessionRequired => 401,
            AuthError::TokenExpired => 401,
            AuthError::MalformedToken => 401,
            AuthError::InvalidSignature => 401,

            // 500 Internal Server Error
            AuthError::TokenGenerationFailed => 500,
            AuthError::Misconfigured(_) => 500,
        }
    }

    /// Returns whether this error should be logged at warn level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
