//! Configuration for the DAXCUR service.
//!
//! Maps to `daxcur.toml`. Environment variables prefixed `DAXCUR__` override
//! file values (`DAXCUR__CHAT__GATEWAY_URL`, `DAXCUR__STORAGE__MAX_EXAMPLES`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CurationError, Result};
use crate::types::ModelType;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "DAXCUR";

/// Top-level configuration, loadable from TOML and the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurationConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Example store settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Chat router and correction endpoint settings.
    #[serde(default)]
    pub chat: ChatConfig,
}

impl CurationConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `CurationError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(toml_str).map_err(|e| CurationError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CurationError::storage(path, e))?;
        Self::from_toml(&content)
    }

    /// Layer defaults, an optional TOML file and `DAXCUR__*` environment
    /// variables (later sources win).
    ///
    /// A missing file is not an error when `path` is `None`; an explicit
    /// path must exist.
    ///
    /// # Errors
    /// Returns `CurationError::Config` on parse or validation failure.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// [`load`](Self::load) with an explicit variable map in place of the
    /// process environment when `env` is `Some`.
    fn load_with_env(path: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name("daxcur").required(false),
        };

        let cfg: Self = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .source(env),
            )
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| CurationError::Config(e.to_string()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would break store or router invariants.
    ///
    /// # Errors
    /// Returns `CurationError::Config` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.storage.max_examples == 0 {
            return Err(CurationError::Config(
                "storage.max_examples must be at least 1".into(),
            ));
        }
        if self.chat.request_timeout_ms == 0 {
            return Err(CurationError::Config(
                "chat.request_timeout_ms must be greater than 0".into(),
            ));
        }
        if let Some(url) = &self.chat.gateway_url {
            check_url("chat.gateway_url", url)?;
        }
        for model in ModelType::ALL {
            if let Some(url) = self.chat.endpoints.get(model) {
                check_url(&format!("chat.endpoints.{model}"), url)?;
            }
        }
        Ok(())
    }
}

fn check_url(key: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(CurationError::Config(format!(
            "{key} must be an http(s) URL, got '{url}'"
        )))
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error. `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Text,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Allowed CORS origins; `"*"` allows any.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Example store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one `{model}-examples.json` per model type.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory holding timestamped snapshots.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    /// Retention cap per model type.
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
    /// Persist the built-in samples for empty collections at startup.
    #[serde(default)]
    pub seed_on_start: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backup_dir: default_backup_dir(),
            max_examples: default_max_examples(),
            seed_on_start: false,
        }
    }
}

/// Chat router configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Shared gateway base URL (tier 1). Skipped when unset.
    #[serde(default)]
    pub gateway_url: Option<String>,
    /// Per-model direct endpoint base URLs (tier 2 and DAX correction).
    #[serde(default)]
    pub endpoints: ModelEndpoints,
    /// Hard timeout for any single upstream call in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    /// `max_tokens` forwarded to direct endpoints.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// `temperature` forwarded to direct endpoints.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            gateway_url: None,
            endpoints: ModelEndpoints::default(),
            request_timeout_ms: default_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Direct endpoint base URL per model type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelEndpoints {
    /// Cognos model service.
    #[serde(default)]
    pub cognos: Option<String>,
    /// MicroStrategy model service.
    #[serde(default)]
    pub microstrategy: Option<String>,
    /// Tableau model service.
    #[serde(default)]
    pub tableau: Option<String>,
}

impl ModelEndpoints {
    /// Base URL configured for `model`, if any.
    #[must_use]
    pub fn get(&self, model: ModelType) -> Option<&str> {
        match model {
            ModelType::Cognos => self.cognos.as_deref(),
            ModelType::Microstrategy => self.microstrategy.as_deref(),
            ModelType::Tableau => self.tableau.as_deref(),
        }
    }

    /// Set the base URL for `model`.
    pub fn set(&mut self, model: ModelType, url: impl Into<String>) {
        let slot = match model {
            ModelType::Cognos => &mut self.cognos,
            ModelType::Microstrategy => &mut self.microstrategy,
            ModelType::Tableau => &mut self.tableau,
        };
        *slot = Some(url.into());
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_bind() -> String { "127.0.0.1:3001".to_string() }
fn default_cors_origins() -> Vec<String> { vec!["http://localhost:3000".to_string()] }
fn default_data_dir() -> PathBuf { PathBuf::from("public/data") }
fn default_backup_dir() -> PathBuf { PathBuf::from("backups") }
fn default_max_examples() -> usize { 10 }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_max_tokens() -> u32 { 1000 }
fn default_temperature() -> f32 { 0.1 }
