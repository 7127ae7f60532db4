//! # HTTP Errors
//!
//! Handler-boundary error that renders the failure envelope. The full
//! error is logged here unscrubbed; clients only ever see the scrubbed
//! message.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::notion::{Scrubber, StoreError};
use crate::upload::UploadError;

use super::response::ApiResponse;

/// Shown when an auth failure is the server's fault
const AUTH_UNAVAILABLE: &str = "Sign-in is unavailable";

/// Error returned by handlers
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Store failure; `fallback` replaces messages that mention settings
    pub fn from_store(err: StoreError, scrubber: &Scrubber, fallback: &str) -> Self {
        let status = status_from(err.status_code());
        let detail = err.to_string();

        if status.is_server_error() {
            error!(error = %detail, "store operation failed");
        } else {
            warn!(error = %detail, "request rejected");
        }

        Self::new(status, scrubber.public_message(&detail, fallback))
    }

    pub fn from_upload(err: UploadError) -> Self {
        let status = status_from(err.status_code());
        if status.is_server_error() {
            error!(error = %err, "image upload failed");
        } else {
            warn!(error = %err, "image upload rejected");
        }
        Self::new(status, err.to_string())
    }

    pub fn from_auth(err: AuthError) -> Self {
        let status = status_from(err.status_code());
        if err.is_client_error() {
            Self::new(status, err.to_string())
        } else {
            error!(error = %err, "sign-in failed");
            Self::new(status, AUTH_UNAVAILABLE)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::failure(self.message))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "malformed request body");
        Self::bad_request(rejection.body_text())
    }
}

/// `Json` extractor whose rejection uses the failure envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manual::ValidationError;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_validation_is_bad_request() {
        let err = ApiError::from_store(
            StoreError::Validation(ValidationError::MissingName),
            &Scrubber::default(),
            "Failed to create manual",
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Product name is required");
    }

    #[test]
    fn test_store_failure_is_scrubbed() {
        let scrubber = Scrubber::new("secret_key", "0123456789abcdef0123456789abcdef");
        let err = ApiError::from_store(
            StoreError::Upstream {
                status: 400,
                code: Some("validation_error".to_string()),
                message: "Database 0123456789abcdef0123456789abcdef is not shared".to_string(),
            },
            &scrubber,
            "Failed to fetch manuals",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("0123456789abcdef"));
        assert!(err.message().contains("[redacted]"));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_server_log_keeps_full_detail() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let scrubber = Scrubber::new("secret_key", "0123456789abcdef0123456789abcdef");
        let err = tracing::subscriber::with_default(subscriber, || {
            ApiError::from_store(
                StoreError::Transport("key secret_key refused".to_string()),
                &scrubber,
                "Failed to fetch manuals",
            )
        });

        assert!(!err.message().contains("secret_key"));
        let logged = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("key secret_key refused"));
    }

    #[test]
    fn test_settings_names_use_fallback() {
        let err = ApiError::from_store(
            StoreError::Transport("NOTION_API_KEY is not set".to_string()),
            &Scrubber::default(),
            "Failed to fetch manuals",
        );
        assert_eq!(err.message(), "Failed to fetch manuals");
    }

    #[test]
    fn test_auth_errors() {
        let err = ApiError::from_auth(AuthError::InvalidCredentials);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "Invalid email or password");

        let err = ApiError::from_auth(AuthError::Misconfigured("hash".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), AUTH_UNAVAILABLE);
    }
}
