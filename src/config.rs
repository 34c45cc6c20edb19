//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub forms: FormsConfig,

    #[serde(default)]
    pub prefs: PrefsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ticket backend connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend (e.g., "http://localhost:5000")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_tickets_path")]
    pub tickets_path: String,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Location the dashboard lives at; used as the post-login return path
    #[serde(default = "default_dashboard_path")]
    pub dashboard_path: String,

    #[serde(default = "default_uploads_path")]
    pub uploads_path: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Raw `Cookie` header value of an existing admin session
    #[serde(default)]
    pub session_cookie: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_tickets_path() -> String {
    "/admin/api/tickets".to_string()
}

fn default_login_path() -> String {
    "/admin/login".to_string()
}

fn default_dashboard_path() -> String {
    "/admin".to_string()
}

fn default_uploads_path() -> String {
    "/uploads".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tickets_path: default_tickets_path(),
            login_path: default_login_path(),
            dashboard_path: default_dashboard_path(),
            uploads_path: default_uploads_path(),
            request_timeout_ms: default_request_timeout(),
            session_cookie: None,
        }
    }
}

impl BackendConfig {
    /// Join a backend-relative path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Dashboard behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Where `export` writes CSV files when no output is given
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_export_dir() -> String {
    ".".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            export_dir: default_export_dir(),
        }
    }
}

/// Public form submission settings
#[derive(Debug, Clone, Deserialize)]
pub struct FormsConfig {
    /// Address offered as a mailto fallback when a submission fails
    #[serde(default = "default_contact_email")]
    pub contact_email: String,
}

fn default_contact_email() -> String {
    "info@example.com".to_string()
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            contact_email: default_contact_email(),
        }
    }
}

/// Local preference storage
#[derive(Debug, Clone, Deserialize)]
pub struct PrefsConfig {
    #[serde(default = "default_prefs_path")]
    pub path: String,
}

fn default_prefs_path() -> String {
    dirs::config_dir()
        .map(|p| p.join("ticketdesk").join("prefs.json").to_string_lossy().to_string())
        .unwrap_or_else(|| "./ticketdesk_prefs.json".to_string())
}

impl Default for PrefsConfig {
    fn default() -> Self {
        Self {
            path: default_prefs_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("ticketdesk").join("config.toml")),
            Some(PathBuf::from("/etc/ticketdesk/config.toml")),
            Some(PathBuf::from("./ticketdesk.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("TICKETDESK_BASE_URL") {
            self.backend.base_url = url;
        }
        if let Some(cookie) = var("TICKETDESK_SESSION") {
            self.backend.session_cookie = Some(cookie);
        }
        if let Some(secs) = var("TICKETDESK_REFRESH_SECS") {
            if let Ok(s) = secs.parse() {
                self.dashboard.refresh_interval_secs = s;
            }
        }
        if let Some(level) = var("TICKETDESK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("TICKETDESK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Ticketdesk Configuration
#
# Environment variables override these settings:
# - TICKETDESK_BASE_URL
# - TICKETDESK_SESSION
# - TICKETDESK_REFRESH_SECS
# - TICKETDESK_LOG_LEVEL
# - TICKETDESK_LOG_FORMAT

[backend]
# Backend base URL
base_url = "http://localhost:5000"

# Ticket list / patch endpoint
tickets_path = "/admin/api/tickets"

# Where to sign in again after a 401
login_path = "/admin/login"

# Dashboard location, used as the post-login return path
dashboard_path = "/admin"

# Attachment download prefix
uploads_path = "/uploads"

# Request timeout in milliseconds
request_timeout_ms = 10000

# Cookie header of an existing admin session
# session_cookie = "session=..."

[dashboard]
# Seconds between refreshes in `watch`
refresh_interval_secs = 30

# Directory for CSV exports
export_dir = "."

[forms]
# Offered as a mailto fallback when a submission fails
contact_email = "info@example.com"

[prefs]
# Theme and draft storage
# path = "~/.config/ticketdesk/prefs.json"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://localhost:5000");
        assert_eq!(config.backend.tickets_path, "/admin/api/tickets");
        assert_eq!(config.dashboard.refresh_interval_secs, 30);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_default_template_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.dashboard.refresh_interval_secs, 30);
        assert_eq!(config.backend.login_path, "/admin/login");
        assert_eq!(config.forms.contact_email, "info@example.com");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse("[backend]\nbase_url = \"https://desk.test/\"\n").unwrap();
        assert_eq!(config.backend.base_url, "https://desk.test/");
        assert_eq!(config.backend.url("/admin/login"), "https://desk.test/admin/login");
        assert_eq!(config.backend.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[backend\n").unwrap();

        match Config::load(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TICKETDESK_BASE_URL", "http://desk:8080"),
            ("TICKETDESK_SESSION", "session=abc"),
            ("TICKETDESK_REFRESH_SECS", "not-a-number"),
            ("TICKETDESK_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.backend.base_url, "http://desk:8080");
        assert_eq!(config.backend.session_cookie.as_deref(), Some("session=abc"));
        assert_eq!(config.dashboard.refresh_interval_secs, 30);
        assert_eq!(config.logging.format, "json");
    }
}
