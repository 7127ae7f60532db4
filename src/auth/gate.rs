//! # Access Gate
//!
//! Session check applied in front of every protected route. A request
//! passes when it carries a valid session token for the allowed identity,
//! either in the session cookie or as a bearer token. Anything else is
//! redirected to the sign-in entry point with the original destination in
//! `callbackUrl`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use reqwest::Url;
use tracing::debug;

use super::credentials::Credentials;
use super::errors::{AuthError, AuthResult};
use super::jwt::{IssuedSession, JwtManager, SessionClaims};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "manual_session";

/// Sign-in entry point that unauthenticated requests are sent to
pub const SIGN_IN_PATH: &str = "/auth/signin";

/// Issues and checks sessions for the single allowed identity
#[derive(Debug, Clone)]
pub struct SessionGate {
    jwt: JwtManager,
    credentials: Credentials,
    secure_cookie: bool,
}

impl SessionGate {
    pub fn new(jwt: JwtManager, credentials: Credentials, secure_cookie: bool) -> Self {
        Self {
            jwt,
            credentials,
            secure_cookie,
        }
    }

    /// Check an email/password pair and issue a session
    pub fn sign_in(&self, email: &str, password: &str) -> AuthResult<IssuedSession> {
        let email = self.credentials.verify(email, password)?;
        self.jwt.issue(&email)
    }

    /// Validate the session carried by `headers`
    pub fn authorize(&self, headers: &HeaderMap) -> AuthResult<SessionClaims> {
        let token = session_token(headers).ok_or(AuthError::SessionRequired)?;
        let claims = self.jwt.validate(token)?;

        if !self.credentials.is_allowed(&claims.sub) {
            return Err(AuthError::SessionRequired);
        }
        Ok(claims)
    }

    /// `Set-Cookie` value carrying `session`
    pub fn session_cookie(&self, session: &IssuedSession) -> String {
        self.cookie(&session.token, self.jwt.session_ttl().num_seconds())
    }

    /// `Set-Cookie` value that removes the session cookie
    pub fn clear_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie =
            format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Axum middleware guarding protected routes
pub async fn require_session(
    State(gate): State<Arc<SessionGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.authorize(request.headers()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            let destination = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            debug!(error = %e, destination, "redirecting to sign-in");
            Redirect::to(&sign_in_location(destination)).into_response()
        }
    }
}

/// Sign-in URL carrying `destination` as `callbackUrl`
pub fn sign_in_location(destination: &str) -> String {
    match Url::parse_with_params(
        &format!("http://localhost{SIGN_IN_PATH}"),
        &[("callbackUrl", destination)],
    ) {
        Ok(url) => format!("{}?{}", url.path(), url.query().unwrap_or_default()),
        Err(_) => SIGN_IN_PATH.to_string(),
    }
}

/// Only same-site paths are honored as post-sign-in destinations
pub fn local_callback(callback: Option<&str>) -> Option<String> {
    callback
        .filter(|c| c.starts_with('/') && !c.starts_with("//") && !c.contains('\\'))
        .map(str::to_string)
}

/// Bearer token first, then the session cookie
fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}
