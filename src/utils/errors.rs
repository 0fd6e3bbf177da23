// src/utils/errors.rs
//! Error types for the diagnostics recorder
//!
//! The recording path itself never fails: capacity overflow, disabled
//! contexts and malformed sampling updates degrade silently. Errors only
//! surface at string parsing boundaries and while loading configuration.

use thiserror::Error;

/// Diagnostics error type
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    /// Configuration could not be loaded or deserialized
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration was loaded but holds an invalid value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A context name outside the closed set of five contexts
    #[error("Unknown diagnostics context: {0}")]
    UnknownContext(String),

    /// A diagnostics type name outside the closed set of five types
    #[error("Unknown diagnostics type: {0}")]
    UnknownDiagnosticsType(String),

    /// Event serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for DiagnosticsError {
    fn from(err: config::ConfigError) -> Self {
        DiagnosticsError::Config(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DiagnosticsError>;
