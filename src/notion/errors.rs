//! # Store Errors
//!
//! Error types for the Notion-backed store, plus the scrubber that strips
//! configuration secrets out of any message shown to a client.

use serde_json::Value;
use thiserror::Error;

use crate::manual::ValidationError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Replacement text for scrubbed secrets
pub const REDACTED: &str = "[redacted]";

/// Names of the settings that must never appear in client-facing text
const CONFIG_KEY_NAMES: [&str; 3] = ["NOTION_API_KEY", "NOTION_DATABASE_ID", "DATABASE_ID"];

/// Store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    // ==================
    // Client Errors
    // ==================
    /// Input rejected before any external call
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The store reports the page as absent or archived
    #[error("Manual not found: {0}")]
    NotFound(String),

    // ==================
    // Upstream Errors
    // ==================
    /// None of the resolution strategies found a database
    #[error(
        "Could not determine the Notion database. Check the configured id and that the integration is connected to it"
    )]
    Resolution,

    /// The API key was rejected
    #[error("Notion rejected the API key")]
    Unauthorized,

    /// Any other non-2xx response
    #[error("Notion API error ({status}): {message}")]
    Upstream {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request never produced a response
    #[error("Notion request failed: {0}")]
    Transport(String),

    /// A 2xx response with an unexpected body
    #[error("Unexpected Notion response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Build an error from a non-2xx response status and its JSON body
    pub fn from_response(status: u16, body: &Value) -> Self {
        let code = body.get("code").and_then(Value::as_str).map(str::to_string);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no error message")
            .to_string();

        if status == 401 || code.as_deref() == Some("unauthorized") {
            return StoreError::Unauthorized;
        }

        StoreError::Upstream {
            status,
            code,
            message,
        }
    }

    /// Whether the store reported the target object as absent
    pub fn is_object_missing(&self) -> bool {
        match self {
            StoreError::NotFound(_) => true,
            StoreError::Upstream { status, code, .. } => {
                *status == 404 || code.as_deref() == Some("object_not_found")
            }
            _ => false,
        }
    }

    /// Errors that end identifier resolution instead of moving on to the
    /// next strategy
    pub fn is_fatal_for_resolution(&self) -> bool {
        matches!(self, StoreError::Unauthorized | StoreError::Transport(_))
    }

    /// HTTP status code for the manuals API
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::Validation(_) => 400,
            _ => 500,
        }
    }
}

/// Removes configured secrets from messages before they leave the process
#[derive(Clone, Default)]
pub struct Scrubber {
    secrets: Vec<String>,
}

impl Scrubber {
    /// Scrub the API key and every spelling of the configured database id
    pub fn new(api_key: &str, database_id: &str) -> Self {
        let mut secrets = Vec::new();
        let api_key = api_key.trim();
        if !api_key.is_empty() {
            secrets.push(api_key.to_string());
        }

        let database_id = database_id.trim();
        if !database_id.is_empty() {
            let compact: String = database_id.chars().filter(|c| *c != '-').collect();
            secrets.push(database_id.to_string());
            if compact.len() == 32 && compact.chars().all(|c| c.is_ascii_hexdigit()) {
                secrets.push(format!(
                    "{}-{}-{}-{}-{}",
                    &compact[0..8],
                    &compact[8..12],
                    &compact[12..16],
                    &compact[16..20],
                    &compact[20..32]
                ));
            }
            secrets.push(compact);
        }

        // Longest first so a shorter secret never splits a longer one
        secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
        secrets.dedup();
        Self { secrets }
    }

    /// Replace every secret occurrence with [`REDACTED`]
    pub fn scrub(&self, message: &str) -> String {
        self.secrets
            .iter()
            .fold(message.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
    }

    /// Message safe to show a client, or `fallback` when the message talks
    /// about the secret settings themselves
    pub fn public_message(&self, message: &str, fallback: &str) -> String {
        if message.is_empty() || CONFIG_KEY_NAMES.iter().any(|key| message.contains(key)) {
            return fallback.to_string();
        }
        self.scrub(message)
    }
}

impl std::fmt::Debug for Scrubber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scrubber")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}
