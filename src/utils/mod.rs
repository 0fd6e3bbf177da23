// src/utils/mod.rs
//! Common utilities: configuration and error types

pub mod config;
pub mod errors;

pub use self::config::{DiagnosticsConfig, DiagnosticsOptions, LoggingConfig, SamplingRatesConfig};
pub use errors::{DiagnosticsError, Result};
