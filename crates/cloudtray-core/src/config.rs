//! Configuration module for CloudTray.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, environment overrides and a builder
//! pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ClientCredentials;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for CloudTray.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub upload: UploadConfig,
    pub recents: RecentsConfig,
    pub logging: LoggingConfig,
}

/// Authentication / OAuth settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Google OAuth client ID. `None` until provided via file or environment.
    pub client_id: Option<String>,
    /// Google OAuth client secret.
    pub client_secret: Option<String>,
    /// Provider authorization endpoint.
    pub authorize_url: String,
    /// The single scope requested.
    pub scope: String,
    /// Scheme and host of the loopback redirect; the listener port is appended.
    pub redirect_host: String,
    /// Seconds to wait for the browser redirect before giving up.
    pub login_timeout_secs: u64,
}

/// Upload view timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// How long progress and feedback stay visible after a batch ends (ms).
    pub feedback_timeout_ms: u64,
    /// How long the "link copied" flag stays set after a single-file upload (ms).
    pub copied_flag_ms: u64,
}

/// Recent uploads view timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentsConfig {
    /// How long the "copied" label stays on an entry after copying its link (ms).
    pub copied_flag_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/cloudtray/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("cloudtray")
            .join("config.yaml")
    }

    /// Applies `CLOUDTRAY_*` overrides looked up through `lookup`.
    ///
    /// Recognised keys: `CLOUDTRAY_CLIENT_ID`, `CLOUDTRAY_CLIENT_SECRET`,
    /// `CLOUDTRAY_LOG`. Empty values are ignored.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(id) = get("CLOUDTRAY_CLIENT_ID") {
            self.auth.client_id = Some(id);
        }
        if let Some(secret) = get("CLOUDTRAY_CLIENT_SECRET") {
            self.auth.client_secret = Some(secret);
        }
        if let Some(level) = get("CLOUDTRAY_LOG") {
            self.logging.level = level;
        }
        self
    }

    /// Applies overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }
}

impl AuthConfig {
    /// Client registration, if both halves are configured.
    pub fn credentials(&self) -> Option<ClientCredentials> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some(ClientCredentials::new(id, secret)),
            _ => None,
        }
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }
}

impl UploadConfig {
    pub fn feedback_timeout(&self) -> Duration {
        Duration::from_millis(self.feedback_timeout_ms)
    }

    pub fn copied_flag(&self) -> Duration {
        Duration::from_millis(self.copied_flag_ms)
    }
}

impl RecentsConfig {
    pub fn copied_flag(&self) -> Duration {
        Duration::from_millis(self.copied_flag_ms)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

// Config derives Default because all its fields implement Default.
// (clippy::derivable_impls)

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            scope: "https://www.googleapis.com/auth/drive.file".to_string(),
            redirect_host: "http://localhost".to_string(),
            login_timeout_secs: 300,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            feedback_timeout_ms: 5000,
            copied_flag_ms: 5000,
        }
    }
}

impl Default for RecentsConfig {
    fn default() -> Self {
        Self {
            copied_flag_ms: 2000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"upload.feedback_timeout_ms"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. Missing client
    /// credentials are not an error: the first auth check simply fails.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- auth ---
        if url::Url::parse(&self.auth.authorize_url).is_err() {
            errors.push(ValidationError {
                field: "auth.authorize_url".into(),
                message: format!("not a valid URL: {}", self.auth.authorize_url),
            });
        }
        if self.auth.scope.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.scope".into(),
                message: "must not be empty".into(),
            });
        }
        match url::Url::parse(&self.auth.redirect_host) {
            Ok(u) if u.scheme() == "http" && u.port().is_none() && u.path() == "/" => {}
            _ => errors.push(ValidationError {
                field: "auth.redirect_host".into(),
                message: format!(
                    "must be an http origin without port or path: {}",
                    self.auth.redirect_host
                ),
            }),
        }
        if self.auth.login_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "auth.login_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- upload ---
        if self.upload.feedback_timeout_ms == 0 {
            errors.push(ValidationError {
                field: "upload.feedback_timeout_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.upload.copied_flag_ms == 0 {
            errors.push(ValidationError {
                field: "upload.copied_flag_ms".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- recents ---
        if self.recents.copied_flag_ms == 0 {
            errors.push(ValidationError {
                field: "recents.copied_flag_ms".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use cloudtray_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .auth_client("my-id.apps.googleusercontent.com", "secret")
///     .upload_feedback_timeout_ms(3000)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // -- auth --

    pub fn auth_client(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.config.auth.client_id = Some(client_id.into());
        self.config.auth.client_secret = Some(client_secret.into());
        self
    }

    pub fn auth_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.config.auth.authorize_url = url.into();
        self
    }

    pub fn auth_scope(mut self, scope: impl Into<String>) -> Self {
        self.config.auth.scope = scope.into();
        self
    }

    pub fn auth_redirect_host(mut self, host: impl Into<String>) -> Self {
        self.config.auth.redirect_host = host.into();
        self
    }

    pub fn auth_login_timeout_secs(mut self, secs: u64) -> Self {
        self.config.auth.login_timeout_secs = secs;
        self
    }

    // -- upload --

    pub fn upload_feedback_timeout_ms(mut self, ms: u64) -> Self {
        self.config.upload.feedback_timeout_ms = ms;
        self
    }

    pub fn upload_copied_flag_ms(mut self, ms: u64) -> Self {
        self.config.upload.copied_flag_ms = ms;
        self
    }

    // -- recents --

    pub fn recents_copied_flag_ms(mut self, ms: u64) -> Self {
        self.config.recents.copied_flag_ms = ms;
        self
    }

    // -- logging --

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    /// Consume the builder and return the [`Config`] without validation.
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the [`Config`] or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
