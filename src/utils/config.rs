// src/utils/config.rs
//! Diagnostics configuration
//!
//! Layered with the `config` crate:
//!
//! 1. Built-in defaults
//! 2. Optional file `config/diagnostics.{toml,yaml,json}`
//! 3. Environment variables prefixed with `DIAGNOSTICS__`
//!    (e.g. `DIAGNOSTICS__DISABLE_DIAGNOSTICS=true`, `DIAGNOSTICS__SAMPLING__DCS=500`)

use crate::utils::errors::{DiagnosticsError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config/diagnostics";
const ENV_PREFIX: &str = "DIAGNOSTICS";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level diagnostics configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Suppress all diagnostics for the `api_call` context
    pub disable_diagnostics: bool,

    /// Initial sampling rate overrides
    pub sampling: SamplingRatesConfig,

    /// Log output settings
    pub logging: LoggingConfig,
}

/// Initial sampling rates, each out of 10000
///
/// Unset fields keep the built-in default. Values go through the same
/// clamping as runtime updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingRatesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dcs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idlist: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialize: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_call: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcir: Option<f64>,
}

impl SamplingRatesConfig {
    /// Render as the loosely-typed update object accepted at runtime
    pub fn to_update(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set
    pub level: String,

    /// Emit JSON-formatted log lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Options frozen into a diagnostics instance at construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsOptions {
    /// Diagnostics disabled for the `api_call` context
    pub disable_diagnostics: bool,
}

impl From<&DiagnosticsConfig> for DiagnosticsOptions {
    fn from(config: &DiagnosticsConfig) -> Self {
        Self {
            disable_diagnostics: config.disable_diagnostics,
        }
    }
}

impl DiagnosticsConfig {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_PATH).required(false));

        Self::finish(builder)
    }

    /// Load configuration from an explicit file and environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading diagnostics configuration from {}", path.display());

        let builder = Config::builder().add_source(File::from(path).required(true));

        Self::finish(builder)
    }

    fn finish(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config: DiagnosticsConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(DiagnosticsError::InvalidConfig(format!(
                "Unknown log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Options read by the diagnostics instance
    pub fn options(&self) -> DiagnosticsOptions {
        DiagnosticsOptions::from(self)
    }
}
