// src/diagnostics/mod.rs
//! SDK diagnostics recorder
//!
//! Records start/end markers around SDK-internal operations, buffers them per
//! context, and hands a context's buffer to an external logger when the
//! owning code finishes a unit of work.
//!
//! - **Context**: the five marker contexts and the current-context default
//! - **Marker**: marker records and per-stage payload schemas
//! - **Store**: bounded per-context buffers (26 markers each)
//! - **Builder**: typed `start` / `end` surface per operation
//! - **Sampling**: per-type emission rates with an injectable random source
//! - **Emission**: sampled forwarding and buffer reset
//! - **Logger**: the external logger seam
//!
//! # Architecture
//!
//! ```text
//! mark().op().start/end ──→ MarkerStore[ctx] (≤26, overflow dropped)
//!                                  │
//! log_diagnostics(ctx, type?) ─────┤
//!        │                         ↓
//!   SamplingPolicy ──emit?──→ DiagnosticsLogger (fire-and-forget)
//!                                  │
//!                           buffer cleared
//! ```
//!
//! Diagnostics never fail the operation they observe: dropped markers,
//! disabled contexts and malformed rate updates are silent no-ops.

pub mod builder;
pub mod context;
pub mod emission;
pub mod logger;
pub mod marker;
pub mod network_error;
pub mod sampling;
pub mod store;

pub use builder::{ActionMarker, ApiCallTag, MarkerBuilder};
pub use context::{ContextState, MarkerContext};
pub use emission::{EmissionController, EmissionOutcome};
pub use logger::{ChannelLogger, DiagnosticsEvent, DiagnosticsLogger, NoopLogger, TracingLogger};
pub use marker::{Marker, MarkerAction, MarkerKey, MarkerStep, MAX_MARKER_COUNT};
pub use network_error::{format_network_error, NetworkErrorInfo};
pub use sampling::{
    DiagnosticsType, FixedSampleSource, SampleSource, SamplingPolicy, SamplingRates,
    ThreadRngSource, MAX_SAMPLING_RATE,
};
pub use store::{AddOutcome, MarkerStore};

use crate::utils::config::{DiagnosticsConfig, DiagnosticsOptions};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::info;

/// One diagnostics instance, created at SDK startup and shared by reference
///
/// Markers only enter the buffers through [`Diagnostics::mark`] and
/// [`Diagnostics::mark_in`], which fix the payload type per stage.
///
/// ```compile_fail
/// use sdk_diagnostics::diagnostics::{Diagnostics, Marker, MarkerAction, MarkerKey, NoopLogger};
/// use sdk_diagnostics::DiagnosticsOptions;
/// use std::sync::Arc;
///
/// let diag = Diagnostics::new(Arc::new(NoopLogger), DiagnosticsOptions::default());
/// let marker = Marker::new(MarkerKey::Bootstrap, None, MarkerAction::Start, 0);
/// diag.add_marker(marker, None);
/// ```
///
/// ```compile_fail
/// use sdk_diagnostics::diagnostics::marker::{ApiCallStart, NoPayload};
/// use sdk_diagnostics::diagnostics::{Diagnostics, NoopLogger};
/// use sdk_diagnostics::DiagnosticsOptions;
/// use std::sync::Arc;
///
/// let diag = Diagnostics::new(Arc::new(NoopLogger), DiagnosticsOptions::default());
/// diag.mark().overall().start(ApiCallStart::new("m1", "my_gate"));
/// ```
pub struct Diagnostics {
    options: DiagnosticsOptions,
    context: ContextState,
    store: MarkerStore,
    sampling: SamplingPolicy,
    emission: EmissionController,
    last_timestamp: AtomicI64,
}

impl Diagnostics {
    /// Create an instance; `options` are frozen for its lifetime
    pub fn new(logger: Arc<dyn DiagnosticsLogger>, options: DiagnosticsOptions) -> Self {
        info!(
            disable_diagnostics = options.disable_diagnostics,
            "Initializing diagnostics"
        );

        Self {
            options,
            context: ContextState::new(),
            store: MarkerStore::new(options.disable_diagnostics),
            sampling: SamplingPolicy::new(),
            emission: EmissionController::new(logger, options.disable_diagnostics),
            last_timestamp: AtomicI64::new(0),
        }
    }

    /// Create an instance from loaded configuration, applying initial rates
    pub fn from_config(logger: Arc<dyn DiagnosticsLogger>, config: &DiagnosticsConfig) -> Self {
        let diagnostics = Self::new(logger, config.options());
        diagnostics.set_sampling_rate(&config.sampling.to_update());
        diagnostics
    }

    /// Replace the random source used for sampling decisions
    pub fn with_sample_source(mut self, source: Box<dyn SampleSource>) -> Self {
        self.sampling.set_source(source);
        self
    }

    pub fn options(&self) -> DiagnosticsOptions {
        self.options
    }

    /// Builder recording into the current context
    pub fn mark(&self) -> MarkerBuilder<'_> {
        MarkerBuilder::new(self, None)
    }

    /// Builder recording into `context` regardless of the current context
    pub fn mark_in(&self, context: MarkerContext) -> MarkerBuilder<'_> {
        MarkerBuilder::new(self, Some(context))
    }

    pub fn set_context(&self, context: MarkerContext) {
        self.context.set(context);
    }

    pub fn context(&self) -> MarkerContext {
        self.context.get()
    }

    /// Append a marker to the override context, or the current one
    pub(crate) fn add_marker(&self, marker: Marker, override_context: Option<MarkerContext>) {
        let context = self.context.resolve(override_context);
        self.store.add(marker, context);
    }

    pub fn get_marker(&self, context: MarkerContext) -> Vec<Marker> {
        self.store.get(context)
    }

    pub fn get_marker_count(&self, context: MarkerContext) -> usize {
        self.store.count(context)
    }

    pub fn clear_marker(&self, context: MarkerContext) {
        self.store.clear(context);
    }

    /// Forward `context`'s markers if sampled in, then reset the buffer
    ///
    /// With no `diagnostics_type` the markers are always forwarded. When
    /// API-call diagnostics are disabled, an `api_call` request returns
    /// without touching the buffer.
    pub fn log_diagnostics(
        &self,
        context: MarkerContext,
        diagnostics_type: Option<DiagnosticsType>,
    ) -> EmissionOutcome {
        self.emission
            .log_diagnostics(context, diagnostics_type, &self.store, &self.sampling)
    }

    /// Apply a sampling rate update (see [`SamplingPolicy::update`])
    pub fn set_sampling_rate(&self, rates: &Value) {
        self.sampling.update(rates);
    }

    pub fn sampling_rates(&self) -> SamplingRates {
        self.sampling.rates()
    }

    /// Epoch milliseconds, never earlier than a previously issued timestamp
    pub(crate) fn now(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self.last_timestamp.fetch_max(now, Ordering::Relaxed);
        previous.max(now)
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("options", &self.options)
            .field("context", &self.context())
            .field("sampling", &self.sampling)
            .finish_non_exhaustive()
    }
}
