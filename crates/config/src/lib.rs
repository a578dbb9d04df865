//! Configuration loading, validation, and management for hindsight.
//!
//! Loads configuration from `~/.hindsight/config.toml` with environment
//! variable overrides. Missing file means defaults; a present but broken
//! file is a startup error, not something to guess around.

pub mod profiles;
pub mod settings;

pub use profiles::{ModelProfile, ResourceProfile};
pub use settings::{Overrides, RunSettings};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The root configuration structure.
///
/// Maps directly to `~/.hindsight/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion proxy.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default model profile name.
    #[serde(default = "default_model_profile")]
    pub model_profile: String,

    /// Default resource profile name.
    #[serde(default = "default_resource_profile")]
    pub resource_profile: String,

    /// Home directory of the agent runtime whose history we read.
    /// Sessions live under `agents/<id>/sessions`, notes under `workspace/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_home: Option<PathBuf>,

    /// Explicit sessions directory, overriding auto-detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions_dir: Option<PathBuf>,

    /// Explicit workspace directory, overriding `<agent_home>/workspace`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_dir: Option<PathBuf>,

    /// Retry behavior for transient backend failures.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: f64,

    /// Custom per-model pricing overrides ($/1M input, $/1M output).
    #[serde(default)]
    pub pricing: HashMap<String, [f64; 2]>,
}

fn default_base_url() -> String {
    "https://api.moonshot.ai/v1".into()
}
fn default_model_profile() -> String {
    "quality".into()
}
fn default_resource_profile() -> String {
    "standard".into()
}
fn default_request_timeout_secs() -> f64 {
    120.0
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model_profile", &self.model_profile)
            .field("resource_profile", &self.resource_profile)
            .field("agent_home", &self.agent_home)
            .field("sessions_dir", &self.sessions_dir)
            .field("workspace_dir", &self.workspace_dir)
            .field("retry", &self.retry)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("pricing", &self.pricing)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt, for transient failures only.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff in seconds; attempt N sleeps `backoff_secs * N`.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: f64,
}

fn default_max_retries() -> u32 {
    2
}
fn default_backoff_secs() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Unknown model profile: {0}")]
    UnknownModelProfile(String),

    #[error("Unknown resource profile: {0}")]
    UnknownResourceProfile(String),
}

impl AppConfig {
    /// Load configuration from disk with environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("HINDSIGHT_API_KEY")
                .ok()
                .or_else(|| std::env::var("MOONSHOT_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(base_url) = std::env::var("HINDSIGHT_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(profile) = std::env::var("HINDSIGHT_MODEL_PROFILE") {
            config.model_profile = profile;
        }

        if let Ok(profile) = std::env::var("HINDSIGHT_RESOURCE_PROFILE") {
            config.resource_profile = profile;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hindsight")
    }

    /// The agent home whose sessions and workspace are read.
    pub fn agent_home(&self) -> PathBuf {
        self.agent_home
            .clone()
            .unwrap_or_else(Self::config_dir)
    }

    /// The workspace directory holding persistent notes.
    pub fn workspace_dir(&self) -> PathBuf {
        self.workspace_dir
            .clone()
            .unwrap_or_else(|| self.agent_home().join("workspace"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs <= 0.0 {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be positive".into(),
            ));
        }
        if self.retry.backoff_secs < 0.0 {
            return Err(ConfigError::Validation(
                "retry.backoff_secs must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model_profile: default_model_profile(),
            resource_profile: default_resource_profile(),
            agent_home: None,
            sessions_dir: None,
            workspace_dir: None,
            retry: RetryConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
            pricing: HashMap::new(),
        }
    }
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.model_profile, "quality");
        assert_eq!(config.resource_profile, "standard");
        assert_eq!(config.retry.max_retries, 2);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn loads_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
model_profile = "speed"
base_url = "http://127.0.0.1:8317/v1"

[retry]
max_retries = 5
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.model_profile, "speed");
        assert_eq!(config.base_url, "http://127.0.0.1:8317/v1");
        assert_eq!(config.retry.max_retries, 5);
        // Unspecified fields keep their defaults.
        assert!((config.retry.backoff_secs - 2.0).abs() < f64::EPSILON);
        assert!((config.request_timeout_secs - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn broken_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model_profile = [unclosed").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn invalid_timeout_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs = 0.0").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret-123".into()),
            ..Default::default()
        };
        let dump = format!("{config:?}");
        assert!(dump.contains("[REDACTED]"));
        assert!(!dump.contains("sk-secret-123"));
    }
}
