//! # Auth Module
//!
//! Credentials sign-in for a single allowed identity, stateless session
//! tokens, and the gate that guards protected routes.

pub mod credentials;
pub mod crypto;
pub mod errors;
pub mod gate;
pub mod jwt;

pub use credentials::Credentials;
pub use errors::{AuthError, AuthResult};
pub use gate::{local_callback, require_session, SessionGate, SESSION_COOKIE, SIGN_IN_PATH};
pub use jwt::{IssuedSession, JwtConfig, JwtManager, SessionClaims};
