// src/diagnostics/store.rs
//! Bounded per-context marker buffers
//!
//! One list per [`MarkerContext`], each behind its own lock. Appends past
//! [`MAX_MARKER_COUNT`] are dropped rather than queued, and markers for the
//! `api_call` context are dropped entirely when API-call diagnostics are
//! disabled. Neither case reports an error to the caller.

use crate::diagnostics::context::MarkerContext;
use crate::diagnostics::marker::{Marker, MAX_MARKER_COUNT};
use metrics::counter;
use parking_lot::Mutex;
use tracing::debug;

/// Outcome of an append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    DroppedDisabled,
    DroppedFull,
}

/// Marker lists for all five contexts
#[derive(Debug)]
pub struct MarkerStore {
    lists: [Mutex<Vec<Marker>>; 5],
    api_calls_disabled: bool,
}

impl MarkerStore {
    pub fn new(api_calls_disabled: bool) -> Self {
        Self {
            lists: std::array::from_fn(|_| Mutex::new(Vec::with_capacity(MAX_MARKER_COUNT))),
            api_calls_disabled,
        }
    }

    /// Append a marker to `context`'s list
    pub(crate) fn add(&self, marker: Marker, context: MarkerContext) -> AddOutcome {
        if self.api_calls_disabled && context == MarkerContext::ApiCall {
            counter!(
                "diagnostics_markers_dropped_total",
                "context" => context.as_str(),
                "reason" => "disabled"
            )
            .increment(1);
            return AddOutcome::DroppedDisabled;
        }

        let mut list = self.lists[context.index()].lock();
        if list.len() >= MAX_MARKER_COUNT {
            debug!(
                "Dropping {} marker, {} buffer full ({} markers)",
                marker.key,
                context,
                list.len()
            );
            counter!(
                "diagnostics_markers_dropped_total",
                "context" => context.as_str(),
                "reason" => "capacity"
            )
            .increment(1);
            return AddOutcome::DroppedFull;
        }

        list.push(marker);
        counter!("diagnostics_markers_recorded_total", "context" => context.as_str())
            .increment(1);
        AddOutcome::Added
    }

    /// Copy of `context`'s markers in insertion order
    pub fn get(&self, context: MarkerContext) -> Vec<Marker> {
        self.lists[context.index()].lock().clone()
    }

    pub fn count(&self, context: MarkerContext) -> usize {
        self.lists[context.index()].lock().len()
    }

    pub fn clear(&self, context: MarkerContext) {
        self.lists[context.index()].lock().clear();
    }

    /// Remove and return `context`'s markers in one locked step
    pub fn take(&self, context: MarkerContext) -> Vec<Marker> {
        std::mem::take(&mut *self.lists[context.index()].lock())
    }
}
