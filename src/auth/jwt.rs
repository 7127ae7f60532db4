//! # Session Tokens
//!
//! Sessions are stateless HS256 JSON Web Tokens whose subject is the
//! signed-in email. Nothing is stored server-side; signing out clears the
//! cookie and the token simply ages out.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{AuthError, AuthResult};

/// JWT claims for session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (signed-in email)
    pub sub: String,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,

    pub aud: String,
    pub iss: String,

    /// Token id
    pub jti: String,
}

impl SessionClaims {
    /// Expiration as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing
    pub secret: String,

    /// Session lifetime
    pub session_ttl: Duration,

    pub issuer: String,
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            session_ttl: Duration::days(7),
            issuer: "manual-shelf".to_string(),
            audience: "manual-shelf".to_string(),
        }
    }
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT manager for session generation and validation
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    /// Create a new JWT manager with the given configuration
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Session lifetime
    pub fn session_ttl(&self) -> Duration {
        self.config.session_ttl
    }

    /// Issue a session token for `email`
    pub fn issue(&self, email: &str) -> AuthResult<IssuedSession> {
        let now = Utc::now();
        let expires_at = now + self.config.session_ttl;

        let claims = SessionClaims {
            sub: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)?;

        Ok(IssuedSession {
            email: email.to_string(),
            token,
            expires_at,
        })
    }

    /// Validate a session token and extract claims
    pub fn validate(&self, token: &str) -> AuthResult<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);

        let token_data =
            decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::MalformedToken,
                }
            })?;

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("session_ttl", &self.config.session_ttl)
            .finish_non_exhaustive()
    }
}
