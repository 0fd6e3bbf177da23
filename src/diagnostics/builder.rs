// src/diagnostics/builder.rs
//! Typed marker builder
//!
//! Each tracked operation exposes `start` / `end` (optionally under a
//! `process` or `network_request` step). The payload types are fixed per
//! stage, so a caller cannot attach a field the stage does not record.
//!
//! ```rust,ignore
//! diagnostics.mark().overall().start(NoPayload);
//! diagnostics
//!     .mark_in(MarkerContext::ConfigSync)
//!     .download_config_specs()
//!     .network_request()
//!     .end(NetworkRequestEnd { success: true, status_code: Some(200), ..Default::default() });
//! ```

use crate::diagnostics::context::MarkerContext;
use crate::diagnostics::marker::{
    ApiCallEnd, ApiCallStart, IdListRequestEnd, IdListRequestStart, IdListSourcesStart, Marker,
    MarkerAction, MarkerIdEnd, MarkerIdStart, MarkerKey, MarkerPayload, MarkerStep,
    NetworkRequestEnd, NoPayload, OutcomeEnd, OverallEnd,
};
use crate::diagnostics::Diagnostics;
use std::marker::PhantomData;

/// Public API whose evaluation can be traced under `api_call`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCallTag {
    GetConfig,
    GetExperiment,
    CheckGate,
    GetLayer,
}

impl ApiCallTag {
    /// Resolve an SDK method name; unknown names have no builder
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "getConfig" => Some(ApiCallTag::GetConfig),
            "getExperiment" => Some(ApiCallTag::GetExperiment),
            "checkGate" => Some(ApiCallTag::CheckGate),
            "getLayer" => Some(ApiCallTag::GetLayer),
            _ => None,
        }
    }

    pub fn key(&self) -> MarkerKey {
        match self {
            ApiCallTag::GetConfig => MarkerKey::GetConfig,
            ApiCallTag::GetExperiment => MarkerKey::GetExperiment,
            ApiCallTag::CheckGate => MarkerKey::CheckGate,
            ApiCallTag::GetLayer => MarkerKey::GetLayer,
        }
    }
}

/// Entry point for recording markers
///
/// Bound to an optional context override; without one, markers land in the
/// instance's current context.
pub struct MarkerBuilder<'a> {
    diagnostics: &'a Diagnostics,
    context: Option<MarkerContext>,
}

impl<'a> MarkerBuilder<'a> {
    pub(crate) fn new(diagnostics: &'a Diagnostics, context: Option<MarkerContext>) -> Self {
        Self {
            diagnostics,
            context,
        }
    }

    pub fn overall(&self) -> ActionMarker<'a, NoPayload, OverallEnd> {
        self.action(MarkerKey::Overall, None)
    }

    pub fn download_config_specs(&self) -> DownloadConfigSpecsMarker<'a> {
        self.steps(MarkerKey::DownloadConfigSpecs)
    }

    pub fn bootstrap(&self) -> BootstrapMarker<'a> {
        ProcessMarker {
            inner: self.action(MarkerKey::Bootstrap, Some(MarkerStep::Process)),
        }
    }

    pub fn get_id_list(&self) -> IdListMarker<'a> {
        self.steps(MarkerKey::GetIdList)
    }

    pub fn get_id_list_sources(&self) -> IdListSourcesMarker<'a> {
        self.steps(MarkerKey::GetIdListSources)
    }

    pub fn get_client_initialize_response(&self) -> ActionMarker<'a, MarkerIdStart, MarkerIdEnd> {
        self.action(MarkerKey::GetClientInitializeResponse, Some(MarkerStep::Process))
    }

    /// Builder for an API call by SDK method name, `None` for unknown names
    pub fn api_call(&self, tag: &str) -> Option<ActionMarker<'a, ApiCallStart, ApiCallEnd>> {
        ApiCallTag::from_tag(tag).map(|tag| self.api_call_for(tag))
    }

    pub fn api_call_for(&self, tag: ApiCallTag) -> ActionMarker<'a, ApiCallStart, ApiCallEnd> {
        self.action(tag.key(), None)
    }

    fn action<S, E>(&self, key: MarkerKey, step: Option<MarkerStep>) -> ActionMarker<'a, S, E> {
        ActionMarker {
            diagnostics: self.diagnostics,
            context: self.context,
            key,
            step,
            _payload: PhantomData,
        }
    }

    fn steps<PS, PE, NS, NE>(&self, key: MarkerKey) -> StepMarker<'a, PS, PE, NS, NE> {
        StepMarker {
            process: self.action(key, Some(MarkerStep::Process)),
            network_request: self.action(key, Some(MarkerStep::NetworkRequest)),
        }
    }
}

/// `start` / `end` for one stage with fixed payload types
pub struct ActionMarker<'a, S, E> {
    diagnostics: &'a Diagnostics,
    context: Option<MarkerContext>,
    key: MarkerKey,
    step: Option<MarkerStep>,
    _payload: PhantomData<fn(S, E)>,
}

impl<S: MarkerPayload, E: MarkerPayload> ActionMarker<'_, S, E> {
    pub fn start(&self, payload: S) {
        self.record(MarkerAction::Start, payload);
    }

    pub fn end(&self, payload: E) {
        self.record(MarkerAction::End, payload);
    }

    fn record<P: MarkerPayload>(&self, action: MarkerAction, payload: P) {
        let marker = Marker::with_payload(
            self.key,
            self.step,
            action,
            self.diagnostics.now(),
            payload,
        );
        self.diagnostics.add_marker(marker, self.context);
    }
}

/// Operation split into `process` and `network_request` steps
pub struct StepMarker<'a, PS, PE, NS, NE> {
    process: ActionMarker<'a, PS, PE>,
    network_request: ActionMarker<'a, NS, NE>,
}

impl<'a, PS, PE, NS, NE> StepMarker<'a, PS, PE, NS, NE> {
    pub fn process(&self) -> &ActionMarker<'a, PS, PE> {
        &self.process
    }

    pub fn network_request(&self) -> &ActionMarker<'a, NS, NE> {
        &self.network_request
    }
}

/// Operation with only a `process` step
pub struct ProcessMarker<'a, S, E> {
    inner: ActionMarker<'a, S, E>,
}

impl<'a, S, E> ProcessMarker<'a, S, E> {
    pub fn process(&self) -> &ActionMarker<'a, S, E> {
        &self.inner
    }
}

pub type DownloadConfigSpecsMarker<'a> =
    StepMarker<'a, NoPayload, OutcomeEnd, NoPayload, NetworkRequestEnd>;

pub type BootstrapMarker<'a> = ProcessMarker<'a, NoPayload, OutcomeEnd>;

pub type IdListMarker<'a> =
    StepMarker<'a, MarkerIdStart, MarkerIdEnd, IdListRequestStart, IdListRequestEnd>;

pub type IdListSourcesMarker<'a> =
    StepMarker<'a, IdListSourcesStart, OutcomeEnd, NoPayload, NetworkRequestEnd>;
