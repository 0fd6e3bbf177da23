// src/diagnostics/emission.rs
//! Sampled emission and reset of a context's markers
//!
//! ```text
//! log_diagnostics(ctx, type?)
//!     │
//!     ├─ api_call && disabled ──→ return (buffer untouched)
//!     │
//!     ├─ take markers (buffer now empty)
//!     │
//!     └─ type? ─ none ─────────────→ emit
//!               └ some ─ sampled ──→ emit
//!                      └ not ─────→ discard
//! ```

use crate::diagnostics::context::MarkerContext;
use crate::diagnostics::logger::{DiagnosticsEvent, DiagnosticsLogger};
use crate::diagnostics::sampling::{DiagnosticsType, SamplingPolicy};
use crate::diagnostics::store::MarkerStore;
use metrics::counter;
use std::sync::Arc;
use tracing::debug;

/// What a call to [`EmissionController::log_diagnostics`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmissionOutcome {
    /// Markers forwarded to the logger and cleared
    Emitted { marker_count: usize },

    /// Markers cleared without being forwarded
    SampledOut { marker_count: usize },

    /// API-call diagnostics disabled; buffer left as it was
    Disabled,
}

/// Decides whether a context's markers reach the external logger
pub struct EmissionController {
    logger: Arc<dyn DiagnosticsLogger>,
    api_calls_disabled: bool,
}

impl EmissionController {
    pub fn new(logger: Arc<dyn DiagnosticsLogger>, api_calls_disabled: bool) -> Self {
        Self {
            logger,
            api_calls_disabled,
        }
    }

    pub fn log_diagnostics(
        &self,
        context: MarkerContext,
        diagnostics_type: Option<DiagnosticsType>,
        store: &MarkerStore,
        sampling: &SamplingPolicy,
    ) -> EmissionOutcome {
        // Buffer is left untouched on this path
        if self.api_calls_disabled && context == MarkerContext::ApiCall {
            return EmissionOutcome::Disabled;
        }

        let should_log = match diagnostics_type {
            None => true,
            Some(ty) => sampling.should_log(ty),
        };

        let markers = store.take(context);
        let marker_count = markers.len();

        if should_log {
            debug!("Emitting {} diagnostics markers for {}", marker_count, context);
            counter!("diagnostics_events_emitted_total", "context" => context.as_str())
                .increment(1);
            self.logger
                .log_diagnostics_event(DiagnosticsEvent::new(context, markers));
            EmissionOutcome::Emitted { marker_count }
        } else {
            debug!("Sampled out {} diagnostics markers for {}", marker_count, context);
            counter!("diagnostics_events_sampled_out_total", "context" => context.as_str())
                .increment(1);
            EmissionOutcome::SampledOut { marker_count }
        }
    }
}
