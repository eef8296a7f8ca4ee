//! Configuration loading for the nimbus CLI.
//!
//! Configuration is loaded from a TOML file (default: `nimbus.toml`).

use nimbus_sdk_client::{AppContext, TransportConfig, TransportKind};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that overrides `auth.access_token`.
pub const ACCESS_TOKEN_ENV: &str = "NIMBUS_ACCESS_TOKEN";

/// Root configuration for the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application configuration.
    pub app: AppConfig,
    /// Credential configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Transport configuration.
    #[serde(default)]
    pub transport: TransportSection,
}

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// API root (default: https://api.example.com/api).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Application identifier.
    pub app_id: String,
    /// Application key.
    pub app_key: String,
}

/// Credential configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Bearer token (optional).
    pub access_token: Option<String>,
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportSection {
    /// Backend: `fetch` or `callback` (default: fetch).
    #[serde(default)]
    pub kind: BackendKind,
    /// Whole-request timeout in seconds, 0 disables it (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Backend names accepted in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// reqwest backend.
    #[default]
    Fetch,
    /// ureq backend.
    Callback,
}

// Default value functions
fn default_base_url() -> String {
    "https://api.example.com/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Apply an access token override. Empty values are ignored.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.auth.access_token = Some(token);
        }
        self
    }

    /// Application context for the client.
    pub fn context(&self) -> AppContext {
        let context = AppContext::new(&self.app.base_url, &self.app.app_id, &self.app.app_key);
        match &self.auth.access_token {
            Some(token) => context.with_access_token(token),
            None => context,
        }
    }

    /// Selected transport backend.
    pub fn transport_kind(&self) -> TransportKind {
        match self.transport.kind {
            BackendKind::Fetch => TransportKind::Fetch,
            BackendKind::Callback => TransportKind::Callback,
        }
    }

    /// Backend settings.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: (self.transport.timeout_secs > 0)
                .then(|| Duration::from_secs(self.transport.timeout_secs)),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
