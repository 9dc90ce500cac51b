//! Configuration loading
//!
//! Resolution follows a fixed priority order:
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing config file is not an error: the service starts on defaults and
//! logs a warning. A config file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the OpenAI-compatible API key
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable overriding the chat model name
pub const ENV_MODEL: &str = "OPENAI_MODEL";
/// Environment variable overriding the image-edit model name
pub const ENV_IMAGE_MODEL: &str = "OPENAI_IMAGE_MODEL";
/// Environment variable overriding the API base URL
pub const ENV_API_BASE: &str = "OPENAI_API_BASE";
/// Environment variable overriding the HTTP bind address
pub const ENV_BIND: &str = "AUTOLIST_BIND";
/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "AUTOLIST_LOG_LEVEL";

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the API listens on
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Remote model endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key; usually supplied through `OPENAI_API_KEY` rather than the file
    pub api_key: Option<String>,
    /// Base URL of the chat-completions API (without trailing slash)
    pub api_base: String,
    /// Chat model used by every agent
    pub model: String,
    /// Model used for photo edits
    pub image_model: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-5.1".to_string(),
            image_model: "gpt-image-1".to_string(),
            request_timeout_secs: 180,
        }
    }
}

impl OpenAiConfig {
    /// API key if configured and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| is_valid_key(key))
    }
}

/// Synthetic-corpus and regression settings for price estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Rows requested from the generator
    pub target_rows: usize,
    /// Rows required to accept a generated batch and to train
    pub min_rows: usize,
    /// Completion token limit for the generation request
    pub max_tokens: u32,
    /// Sampling temperature per generation attempt; its length is the attempt limit
    pub temperatures: Vec<f32>,
    /// Boosting rounds
    pub iterations: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f64,
    /// Maximum tree depth
    pub depth: usize,
    /// Seed for the train/test split
    pub seed: u64,
    /// Share of rows held out for MAE
    pub test_fraction: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            target_rows: 50,
            min_rows: 10,
            max_tokens: 16384,
            temperatures: vec![0.7, 0.9],
            iterations: 300,
            learning_rate: 0.05,
            depth: 6,
            seed: 42,
            test_fraction: 0.2,
        }
    }
}

/// Request size limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Uploaded images above this size are skipped
    pub max_image_bytes: usize,
    /// Images forwarded to the photo advisor
    pub max_advisor_images: usize,
    /// Whole request body limit (multipart uploads, base64 JSON bodies)
    pub max_request_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 15 * 1024 * 1024,
            max_advisor_images: 20,
            max_request_bytes: 100 * 1024 * 1024,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete service configuration as read from `autolist-ai.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub openai: OpenAiConfig,
    pub pricing: PricingConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load from `path` (or the platform default path), falling back to
    /// compiled defaults when no file exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(explicit) => Some(explicit.to_path_buf()),
            None => default_config_path(),
        };

        match path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|value| is_valid_key(value));

        if let Some(key) = non_blank(ENV_API_KEY) {
            if self.openai.api_key().is_some() {
                warn!("API key found in both environment and TOML. Using environment.");
            }
            self.openai.api_key = Some(key.trim().to_string());
        }
        if let Some(model) = non_blank(ENV_MODEL) {
            self.openai.model = model.trim().to_string();
        }
        if let Some(image_model) = non_blank(ENV_IMAGE_MODEL) {
            self.openai.image_model = image_model.trim().to_string();
        }
        if let Some(base) = non_blank(ENV_API_BASE) {
            self.openai.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(bind) = non_blank(ENV_BIND) {
            self.server.bind_address = bind.trim().to_string();
        }
        if let Some(level) = non_blank(ENV_LOG_LEVEL) {
            self.logging.level = level.trim().to_string();
        }
    }

    /// Reject settings the pricing engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let pricing = &self.pricing;
        if pricing.temperatures.is_empty() {
            return Err(Error::Config(
                "pricing.temperatures must list at least one attempt".to_string(),
            ));
        }
        if pricing.min_rows < 2 {
            return Err(Error::Config("pricing.min_rows must be at least 2".to_string()));
        }
        if pricing.target_rows < pricing.min_rows {
            return Err(Error::Config(format!(
                "pricing.target_rows ({}) is below pricing.min_rows ({})",
                pricing.target_rows, pricing.min_rows
            )));
        }
        if !(pricing.learning_rate > 0.0 && pricing.learning_rate <= 1.0) {
            return Err(Error::Config(format!(
                "pricing.learning_rate must be in (0, 1], got {}",
                pricing.learning_rate
            )));
        }
        if !(pricing.test_fraction > 0.0 && pricing.test_fraction < 1.0) {
            return Err(Error::Config(format!(
                "pricing.test_fraction must be in (0, 1), got {}",
                pricing.test_fraction
            )));
        }
        if pricing.depth == 0 || pricing.iterations == 0 {
            return Err(Error::Config(
                "pricing.depth and pricing.iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validate a credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Platform config file location: `<config dir>/autolist/autolist-ai.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("autolist").join("autolist-ai.toml"))
}
