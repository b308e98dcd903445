//! Configuration loading, validation, and management for Veridian.
//!
//! Loads configuration from `$VERIDIAN_CONFIG` or `~/.veridian/config.toml`
//! with environment variable overrides. Validates all settings at startup.
//! A missing generation API key is not an error: it disables the AI service.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat pipeline settings (rate limit, context fetching, prompt)
    #[serde(default)]
    pub chat: ChatConfig,

    /// Text-generation service settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Document store settings
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Requests admitted per user within one timeframe
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,

    /// Length of the sliding rate-limit window
    #[serde(default = "default_timeframe_seconds")]
    pub timeframe_seconds: u64,

    /// Upper bound on concurrent blocking store lookups
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Interval of the idle rate-limit window sweep; 0 disables it
    #[serde(default)]
    pub sweep_interval_secs: u64,

    /// Replace the built-in assistant directive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_directive: Option<String>,
}

fn default_max_requests() -> usize {
    5
}
fn default_timeframe_seconds() -> u64 {
    60
}
fn default_max_concurrent_fetches() -> usize {
    16
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            timeframe_seconds: default_timeframe_seconds(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            sweep_interval_secs: 0,
            system_directive: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider API key; absent or blank disables the AI service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider kind ("gemini", "openai", "openrouter", "ollama", ...)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name passed to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Upper bound on a single generation call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-1.5-flash".into()
}
fn default_timeout_secs() -> u64 {
    15
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: default_model(),
            api_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "file" (JSON documents on disk) or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Root directory of the file backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_store_backend() -> String {
    "file".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

impl StoreConfig {
    /// The configured directory, or `~/.veridian/store`.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("store"))
    }
}

const STORE_BACKENDS: &[&str] = &["file", "memory"];

/// Providers with a built-in endpoint; any other provider needs `api_url`.
pub const KNOWN_PROVIDERS: &[&str] = &[
    "gemini",
    "openrouter",
    "openai",
    "ollama",
    "groq",
    "together",
    "vllm",
];

impl AppConfig {
    /// Load configuration from `$VERIDIAN_CONFIG` or the default path.
    ///
    /// Environment variables override file values:
    /// - `GEMINI_API_KEY`, then `VERIDIAN_API_KEY`
    /// - `CHAT_MAX_REQUESTS`, `CHAT_TIMEFRAME_SECONDS`, `CHAT_GENERATION_TIMEOUT_SECS`
    /// - `VERIDIAN_PROVIDER`, `VERIDIAN_MODEL`, `VERIDIAN_STORE_DIR`, `PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("VERIDIAN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"));
        Self::load_with(&config_path, |key| std::env::var(key).ok())
    }

    /// Load configuration from a specific file path, without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// File values, then `lookup` overrides, validated once on the result.
    fn load_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::read_file(path)?;
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
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

        Ok(config)
    }

    /// Apply environment overrides through `lookup` (a stand-in for `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("VERIDIAN_API_KEY")) {
            self.generation.api_key = Some(key);
        }
        if let Some(provider) = lookup("VERIDIAN_PROVIDER") {
            self.generation.provider = provider;
        }
        if let Some(model) = lookup("VERIDIAN_MODEL") {
            self.generation.model = model;
        }
        if let Some(dir) = lookup("VERIDIAN_STORE_DIR") {
            self.store.path = Some(PathBuf::from(dir));
        }

        override_parsed(&lookup, "CHAT_MAX_REQUESTS", &mut self.chat.max_requests);
        override_parsed(&lookup, "CHAT_TIMEFRAME_SECONDS", &mut self.chat.timeframe_seconds);
        override_parsed(
            &lookup,
            "CHAT_GENERATION_TIMEOUT_SECS",
            &mut self.generation.timeout_secs,
        );
        override_parsed(&lookup, "PORT", &mut self.gateway.port);
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".veridian")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.chat.max_requests == 0 {
            return Err(ConfigError::ValidationError(
                "chat.max_requests must be at least 1".into(),
            ));
        }
        if self.chat.timeframe_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "chat.timeframe_seconds must be at least 1".into(),
            ));
        }
        if self.chat.max_concurrent_fetches == 0 {
            return Err(ConfigError::ValidationError(
                "chat.max_concurrent_fetches must be at least 1".into(),
            ));
        }
        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "generation.timeout_secs must be at least 1".into(),
            ));
        }
        if !STORE_BACKENDS.contains(&self.store.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "store.backend must be one of {STORE_BACKENDS:?}, got '{}'",
                self.store.backend
            )));
        }
        if self.generation.api_url.is_none()
            && !KNOWN_PROVIDERS.contains(&self.generation.provider.as_str())
        {
            return Err(ConfigError::ValidationError(format!(
                "generation.provider '{}' has no default endpoint; set generation.api_url",
                self.generation.provider
            )));
        }
        Ok(())
    }

    /// Check if a usable API key is available.
    pub fn has_api_key(&self) -> bool {
        self.generation
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string (for `veridian config`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Replace `slot` with the parsed env value; unparseable values are ignored.
fn override_parsed<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *slot = value,
            Err(_) => tracing::warn!(key, value = %raw, "Ignoring unparseable environment override"),
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
