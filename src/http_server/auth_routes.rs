//! Auth HTTP Routes
//!
//! Credentials sign-in, sign-out and session lookup. The session token is
//! set as an `HttpOnly` cookie; API clients may also send it as a bearer
//! token.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{local_callback, SessionClaims, SessionGate};

use super::errors::{ApiError, ApiJson};
use super::response::ApiResponse;

/// Auth routes with shared state
pub fn auth_routes(gate: Arc<SessionGate>) -> Router {
    Router::new()
        .route("/auth/signin", get(sign_in_prompt).post(sign_in))
        .route("/auth/signout", post(sign_out))
        .route("/auth/session", get(current_session))
        .with_state(gate)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub email: String,
    pub expires_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInQuery {
    #[serde(default)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInPrompt {
    pub sign_in: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub email: String,
    pub expires_at: String,
}

impl From<&SessionClaims> for SessionResponse {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            email: claims.sub.clone(),
            expires_at: claims.expires_at().to_rfc3339(),
        }
    }
}

// ==================
// Handlers
// ==================

/// Where the gate sends unauthenticated requests
async fn sign_in_prompt(Query(query): Query<SignInQuery>) -> impl IntoResponse {
    let prompt = SignInPrompt {
        sign_in: "POST /auth/signin",
        callback_url: local_callback(query.callback_url.as_deref()),
    };
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::failure_with("Sign-in required", prompt)),
    )
}

async fn sign_in(
    State(gate): State<Arc<SessionGate>>,
    ApiJson(request): ApiJson<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = gate
        .sign_in(&request.email, &request.password)
        .map_err(ApiError::from_auth)?;

    info!(email = %session.email, "signed in");
    let response = SignInResponse {
        email: session.email.clone(),
        expires_at: session.expires_at.to_rfc3339(),
        callback_url: local_callback(request.callback_url.as_deref()),
    };
    Ok((
        [(header::SET_COOKIE, gate.session_cookie(&session))],
        Json(ApiResponse::ok(response)),
    ))
}

async fn sign_out(State(gate): State<Arc<SessionGate>>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, gate.clear_cookie())],
        Json(ApiResponse::ok(())),
    )
}

/// Current session, or `null` when there is none
async fn current_session(
    State(gate): State<Arc<SessionGate>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session = gate
        .authorize(&headers)
        .ok()
        .map(|claims| SessionResponse::from(&claims));
    Json(ApiResponse::ok(session))
}
