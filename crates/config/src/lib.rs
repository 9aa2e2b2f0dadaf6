//! Configuration loading, validation, and management for Aula.
//!
//! Loads configuration from `~/.aula/config.toml` (or the file named by
//! `AULA_CONFIG`) with environment variable overrides. Validates all
//! settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.aula/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider). Local Ollama ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Timeout for a single model backend call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum tool call iterations per agent turn
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,

    /// Cap on tokens per model response; unset leaves it to the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Replaces the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Student store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "qwen3:1.7b".into()
}
fn default_temperature() -> f32 {
    0.75
}
fn default_request_timeout() -> u64 {
    120
}
fn default_max_tool_iterations() -> u32 {
    10
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_tool_iterations", &self.max_tool_iterations)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("store", &self.store)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the roster JSON file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Fail `add` when the file cannot be written, instead of logging and
    /// keeping the record in memory only.
    #[serde(default)]
    pub strict_writes: bool,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data").join("alumnos.json")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            strict_writes: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Serve the embedded chat page on `/`
    #[serde(default = "default_true")]
    pub serve_frontend: bool,
}

fn default_port() -> u16 {
    3001
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_true() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            serve_frontend: true,
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from `$AULA_CONFIG` or `~/.aula/config.toml`.
    ///
    /// Environment overrides (highest priority):
    /// - `AULA_PROVIDER`, `AULA_MODEL`
    /// - `AULA_STUDENTS_FILE`
    /// - `AULA_API_KEY`, then `OPENAI_API_KEY` when no key is configured
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_at(&Self::config_path())
    }

    /// Like `load`, but reading an explicit file.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup function.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = var("AULA_API_KEY").or_else(|| var("OPENAI_API_KEY"));
        }
        if let Some(provider) = var("AULA_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = var("AULA_MODEL") {
            self.default_model = model;
        }
        if let Some(path) = var("AULA_STUDENTS_FILE") {
            self.store.path = PathBuf::from(path);
        }
    }

    /// Path of the active config file.
    pub fn config_path() -> PathBuf {
        std::env::var("AULA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"))
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aula")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }
        if self.max_tool_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_tool_iterations must be >= 1".into(),
            ));
        }
        if self.max_tokens == Some(0) {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }
        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError("gateway.port must be > 0".into()));
        }
        Ok(())
    }

    /// Resolve the API key for a provider: per-provider key, then global key.
    pub fn api_key_for(&self, provider: &str) -> String {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
            .unwrap_or_default()
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let mut config = Self::default();
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_key: None,
                api_url: Some("http://localhost:11434/v1".into()),
            },
        );
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
            max_tool_iterations: default_max_tool_iterations(),
            max_tokens: None,
            system_prompt: None,
            store: StoreConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
