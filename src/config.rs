//! # Application Configuration
//!
//! Loaded from an optional JSON file, then overridden field by field from
//! the environment. Secrets never appear in `Debug` output or in
//! validation messages.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    /// A required setting is absent; names the setting, never its value
    #[error("Missing setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Listener settings, flattened into the top level of the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind host (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl ServerSettings {
    /// `host:port` for the listener
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Document store settings
#[derive(Clone, Serialize, Deserialize)]
pub struct NotionSettings {
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub database_id: String,

    /// API root (default: "https://api.notion.com/v1")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Sign-in settings
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub allowed_email: String,

    /// Argon2 PHC string
    #[serde(default)]
    pub password_hash: Option<String>,

    /// Same hash, base64-encoded; used when `password_hash` is absent
    #[serde(default)]
    pub password_hash_b64: Option<String>,

    /// HS256 signing secret for session tokens
    #[serde(default)]
    pub session_secret: String,

    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,

    /// Mark the session cookie `Secure`
    #[serde(default)]
    pub secure_cookie: bool,
}

/// Full application configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub server: ServerSettings,

    #[serde(default)]
    pub notion: NotionSettings,

    #[serde(default)]
    pub auth: AuthSettings,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// The local dev origins
fn default_cors_origins() -> Vec<String> {
    ["http://localhost:3000", "http://127.0.0.1:3000"]
        .map(String::from)
        .to_vec()
}

fn default_base_url() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_session_ttl_days() -> i64 {
    7
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            database_id: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            allowed_email: String::new(),
            password_hash: None,
            password_hash_b64: None,
            session_secret: String::new(),
            session_ttl_days: default_session_ttl_days(),
            secure_cookie: false,
        }
    }
}

impl AppConfig {
    /// Load from `path` (when given) and the process environment
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from a JSON file only
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Override fields from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = var("MANUALS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("MANUALS_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "port",
                message: format!("'{port}' is not a port number"),
            })?;
        }

        if let Some(key) = var("NOTION_API_KEY") {
            self.notion.api_key = key;
        }
        if let Some(id) = var("NOTION_DATABASE_ID") {
            self.notion.database_id = id;
        }
        if let Some(url) = var("NOTION_BASE_URL") {
            self.notion.base_url = url;
        }

        if let Some(email) = var("ALLOWED_EMAIL") {
            self.auth.allowed_email = email;
        }
        if let Some(hash) = var("HASHED_PASSWORD") {
            self.auth.password_hash = Some(hash);
        }
        if let Some(hash) = var("HASHED_PASSWORD_B64") {
            self.auth.password_hash_b64 = Some(hash);
        }
        if let Some(secret) = var("SESSION_SECRET") {
            self.auth.session_secret = secret;
        }

        self.notion.database_id = self.notion.database_id.trim().to_string();
        Ok(())
    }

    /// Check everything needed to serve against the real document store
    pub fn validate(&self) -> ConfigResult<()> {
        if self.notion.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("NOTION_API_KEY"));
        }
        if self.notion.database_id.trim().is_empty() {
            return Err(ConfigError::Missing("NOTION_DATABASE_ID"));
        }
        if reqwest::Url::parse(&self.notion.base_url).is_err() {
            return Err(ConfigError::Invalid {
                field: "notion.base_url",
                message: "not an absolute URL".to_string(),
            });
        }
        if self.notion.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "notion.timeout_secs",
                message: "must be > 0".to_string(),
            });
        }
        self.validate_auth()
    }

    /// Check the sign-in settings only
    pub fn validate_auth(&self) -> ConfigResult<()> {
        if self.auth.allowed_email.trim().is_empty() {
            return Err(ConfigError::Missing("ALLOWED_EMAIL"));
        }
        if !self.has_password_hash() {
            return Err(ConfigError::Missing("HASHED_PASSWORD"));
        }
        if self.auth.session_secret.is_empty() {
            return Err(ConfigError::Missing("SESSION_SECRET"));
        }
        if self.auth.session_ttl_days <= 0 {
            return Err(ConfigError::Invalid {
                field: "auth.session_ttl_days",
                message: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    fn has_password_hash(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.auth.password_hash) || set(&self.auth.password_hash_b64)
    }

    /// Which settings are present, by name; values are never included
    pub fn presence(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("NOTION_API_KEY", !self.notion.api_key.trim().is_empty()),
            ("NOTION_DATABASE_ID", !self.notion.database_id.is_empty()),
            ("ALLOWED_EMAIL", !self.auth.allowed_email.trim().is_empty()),
            ("HASHED_PASSWORD", self.has_password_hash()),
            ("SESSION_SECRET", !self.auth.session_secret.is_empty()),
        ]
    }
}

fn mask(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "[redacted]"
    }
}

impl std::fmt::Debug for NotionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionSettings")
            .field("api_key", &mask(&self.api_key))
            .field("database_id", &mask(&self.database_id))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("allowed_email", &self.allowed_email)
            .field(
                "password_hash",
                &mask(self.password_hash.as_deref().unwrap_or_default()),
            )
            .field(
                "password_hash_b64",
                &mask(self.password_hash_b64.as_deref().unwrap_or_default()),
            )
            .field("session_secret", &mask(&self.session_secret))
            .field("session_ttl_days", &self.session_ttl_days)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("server", &self.server)
            .field("notion", &self.notion)
            .field("auth", &self.auth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete() -> AppConfig {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("NOTION_API_KEY", "secret_abc123"),
                ("NOTION_DATABASE_ID", " 0123456789abcdef0123456789abcdef "),
                ("ALLOWED_EMAIL", "owner@example.com"),
                ("HASHED_PASSWORD", "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"),
                ("SESSION_SECRET", "session-signing-secret"),
            ]))
            .unwrap();
        config
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.socket_addr(), "0.0.0.0:3000");
        assert_eq!(config.server.cors_origins.len(), 2);
        assert_eq!(config.notion.base_url, "https://api.notion.com/v1");
        assert_eq!(config.notion.timeout_secs, 30);
        assert_eq!(config.auth.session_ttl_days, 7);
    }

    #[test]
    fn test_env_overrides_and_trims_database_id() {
        let config = complete();
        assert_eq!(config.notion.database_id, "0123456789abcdef0123456789abcdef");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_names_missing_setting() {
        let mut config = complete();
        config.notion.api_key.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("NOTION_API_KEY"))
        ));

        let mut config = complete();
        config.auth.password_hash = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("HASHED_PASSWORD"))
        ));
        config.auth.password_hash_b64 = Some("JGFyZ29uMmlk".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(env(&[("MANUALS_PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::Invalid { field: "port", .. })));
    }

    #[test]
    fn test_file_then_env() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"port": 8080, "cors_origins": [], "notion": {{"database_id": "from-file", "timeout_secs": 5}}}}"#
        )
        .unwrap();

        let mut config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.notion.timeout_secs, 5);

        config
            .apply_env(env(&[("NOTION_DATABASE_ID", "from-env")]))
            .unwrap();
        assert_eq!(config.notion.database_id, "from-env");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_missing_and_malformed_files() {
        assert!(matches!(
            AppConfig::from_file(Path::new("/nonexistent/manuals.json")),
            Err(ConfigError::Read { .. })
        ));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            AppConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_debug_and_presence_hide_secrets() {
        let config = complete();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret_abc123"));
        assert!(!debug.contains("0123456789abcdef"));
        assert!(!debug.contains("session-signing-secret"));
        assert!(!debug.contains("argon2id"));
        assert!(debug.contains("owner@example.com"));

        assert!(config.presence().iter().all(|(_, present)| *present));
        assert!(!format!("{:?}", config.presence()).contains("secret_abc123"));
    }
}
