// src/observability/mod.rs
//! Logging and metrics setup
//!
//! The diagnostics recorder reports on itself through `tracing` and the
//! `metrics` facade:
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `diagnostics_markers_recorded_total` | Counter | `context` |
//! | `diagnostics_markers_dropped_total` | Counter | `context`, `reason` |
//! | `diagnostics_events_emitted_total` | Counter | `context` |
//! | `diagnostics_events_sampled_out_total` | Counter | `context` |

use crate::utils::config::LoggingConfig;
use crate::utils::errors::{DiagnosticsError, Result};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| DiagnosticsError::InvalidConfig(format!("Log filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| DiagnosticsError::InvalidConfig(format!("Tracing init: {}", e)))
}

/// Install the Prometheus recorder and describe diagnostics metrics
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| DiagnosticsError::InvalidConfig(format!("Metrics init: {}", e)))?;

    describe_counter!(
        "diagnostics_markers_recorded_total",
        "Markers appended to a context buffer"
    );
    describe_counter!(
        "diagnostics_markers_dropped_total",
        "Markers dropped because the buffer was full or the context disabled"
    );
    describe_counter!(
        "diagnostics_events_emitted_total",
        "Context buffers forwarded to the external logger"
    );
    describe_counter!(
        "diagnostics_events_sampled_out_total",
        "Context buffers cleared without being forwarded"
    );

    Ok(handle)
}
