// src/diagnostics/logger.rs
//! External logger seam
//!
//! Emission hands a [`DiagnosticsEvent`] to a [`DiagnosticsLogger`] and moves
//! on. Loggers must not block and must swallow their own failures.

use crate::diagnostics::context::MarkerContext;
use crate::diagnostics::marker::Marker;
use crate::utils::errors::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Event name used when a diagnostics event is wrapped for the SDK event stream
pub const DIAGNOSTICS_EVENT_NAME: &str = "statsig::diagnostics";

/// One context's buffered markers, ready to ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsEvent {
    pub context: MarkerContext,
    pub markers: Vec<Marker>,
}

impl DiagnosticsEvent {
    pub fn new(context: MarkerContext, markers: Vec<Marker>) -> Self {
        Self { context, markers }
    }

    /// Wrap as an SDK log event carrying this event as metadata
    pub fn to_log_event(&self) -> Result<Value> {
        Ok(json!({
            "eventName": DIAGNOSTICS_EVENT_NAME,
            "metadata": serde_json::to_value(self)?,
            "time": chrono::Utc::now().timestamp_millis(),
        }))
    }
}

/// Receiver of emitted diagnostics events
pub trait DiagnosticsLogger: Send + Sync {
    /// Submit an event; fire-and-forget
    fn log_diagnostics_event(&self, event: DiagnosticsEvent);
}

/// Writes events as structured log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl DiagnosticsLogger for TracingLogger {
    fn log_diagnostics_event(&self, event: DiagnosticsEvent) {
        match serde_json::to_string(&event.markers) {
            Ok(markers) => info!(
                target: "diagnostics",
                context = %event.context,
                marker_count = event.markers.len(),
                markers = %markers,
                "Diagnostics event"
            ),
            Err(e) => debug!("Failed to serialize diagnostics event: {}", e),
        }
    }
}

/// Forwards events to an async consumer
#[derive(Debug, Clone)]
pub struct ChannelLogger {
    tx: mpsc::UnboundedSender<DiagnosticsEvent>,
}

impl ChannelLogger {
    /// Create a logger and the receiving half of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DiagnosticsEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DiagnosticsLogger for ChannelLogger {
    fn log_diagnostics_event(&self, event: DiagnosticsEvent) {
        if self.tx.send(event).is_err() {
            debug!("Diagnostics receiver closed, dropping event");
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl DiagnosticsLogger for NoopLogger {
    fn log_diagnostics_event(&self, _event: DiagnosticsEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::marker::{MarkerAction, MarkerKey};

    fn sample_event() -> DiagnosticsEvent {
        DiagnosticsEvent::new(
            MarkerContext::ConfigSync,
            vec![Marker::new(
                MarkerKey::DownloadConfigSpecs,
                None,
                MarkerAction::Start,
                10,
            )],
        )
    }

    #[test]
    fn test_event_wire_shape() {
        let value = serde_json::to_value(sample_event()).unwrap();

        assert_eq!(value["context"], "config_sync");
        assert_eq!(value["markers"][0]["key"], "download_config_specs");
        assert_eq!(value["markers"][0]["action"], "start");
    }

    #[test]
    fn test_log_event_wrapper() {
        let log_event = sample_event().to_log_event().unwrap();

        assert_eq!(log_event["eventName"], DIAGNOSTICS_EVENT_NAME);
        assert_eq!(log_event["metadata"]["context"], "config_sync");
        assert!(log_event["time"].is_i64());
    }

    #[tokio::test]
    async fn test_channel_logger_delivers() {
        let (logger, mut rx) = ChannelLogger::channel();
        logger.log_diagnostics_event(sample_event());

        let received = rx.recv().await.unwrap();
        assert_eq!(received, sample_event());
    }

    #[test]
    fn test_channel_logger_closed_receiver() {
        let (logger, rx) = ChannelLogger::channel();
        drop(rx);

        // Must not panic or report anything to the caller
        logger.log_diagnostics_event(sample_event());
    }

    #[test]
    fn test_tracing_and_noop_loggers() {
        TracingLogger.log_diagnostics_event(sample_event());
        NoopLogger.log_diagnostics_event(sample_event());
    }
}
