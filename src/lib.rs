// src/lib.rs
//! SDK Diagnostics Library
//!
//! In-process recorder for SDK-internal timing markers with per-context
//! buffering and sampled emission to an external logger.
//!
//! # Architecture
//!
//! The crate is structured into three modules:
//!
//! - **diagnostics**: markers, buffers, typed builder, sampling, emission
//! - **observability**: tracing subscriber and metrics recorder setup
//! - **utils**: configuration and error types

// Public module exports
pub mod diagnostics;
pub mod observability;
pub mod utils;

// Re-export commonly used types
pub use diagnostics::{
    format_network_error, Diagnostics, DiagnosticsEvent, DiagnosticsLogger, DiagnosticsType,
    EmissionOutcome, Marker, MarkerContext,
};
pub use utils::config::{DiagnosticsConfig, DiagnosticsOptions};
pub use utils::errors::{DiagnosticsError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_HASH: &str = env!("GIT_HASH");

/// Library build information
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            git_hash: GIT_HASH,
            build_timestamp: env!("BUILD_TIMESTAMP"),
            rustc_version: env!("RUSTC_VERSION"),
        }
    }
}
