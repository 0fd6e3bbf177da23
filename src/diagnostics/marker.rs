// src/diagnostics/marker.rs
//! Marker records and per-operation payload schemas
//!
//! A [`Marker`] carries the full set of optional payload fields on the wire,
//! but callers never fill them directly. Each `(operation, step, action)`
//! has its own payload struct, and the builder only accepts the struct that
//! belongs to the stage being recorded.
//!
//! | operation | step | start | end |
//! |-----------|------|-------|-----|
//! | `overall` | - | [`NoPayload`] | [`OverallEnd`] |
//! | `download_config_specs` | process | [`NoPayload`] | [`OutcomeEnd`] |
//! | `download_config_specs` | network_request | [`NoPayload`] | [`NetworkRequestEnd`] |
//! | `bootstrap` | process | [`NoPayload`] | [`OutcomeEnd`] |
//! | `get_id_list_sources` | process | [`IdListSourcesStart`] | [`OutcomeEnd`] |
//! | `get_id_list_sources` | network_request | [`NoPayload`] | [`NetworkRequestEnd`] |
//! | `get_id_list` | process | [`MarkerIdStart`] | [`MarkerIdEnd`] |
//! | `get_id_list` | network_request | [`IdListRequestStart`] | [`IdListRequestEnd`] |
//! | `get_client_initialize_response` | process | [`MarkerIdStart`] | [`MarkerIdEnd`] |
//! | api calls | - | [`ApiCallStart`] | [`ApiCallEnd`] |

use crate::diagnostics::network_error::NetworkErrorInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum markers buffered per context
pub const MAX_MARKER_COUNT: usize = 26;

/// Operation a marker belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKey {
    Overall,
    DownloadConfigSpecs,
    Bootstrap,
    GetIdList,
    GetIdListSources,
    GetClientInitializeResponse,
    GetConfig,
    GetExperiment,
    CheckGate,
    GetLayer,
}

impl MarkerKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerKey::Overall => "overall",
            MarkerKey::DownloadConfigSpecs => "download_config_specs",
            MarkerKey::Bootstrap => "bootstrap",
            MarkerKey::GetIdList => "get_id_list",
            MarkerKey::GetIdListSources => "get_id_list_sources",
            MarkerKey::GetClientInitializeResponse => "get_client_initialize_response",
            MarkerKey::GetConfig => "get_config",
            MarkerKey::GetExperiment => "get_experiment",
            MarkerKey::CheckGate => "check_gate",
            MarkerKey::GetLayer => "get_layer",
        }
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerAction {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStep {
    Process,
    NetworkRequest,
}

/// Why an operation ended without completing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Timeout,
}

/// One timestamped start or end record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub(crate) key: MarkerKey,
    pub(crate) action: MarkerAction,

    /// Milliseconds since the Unix epoch
    pub(crate) timestamp: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) step: Option<MarkerStep>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) status_code: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<NetworkErrorInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) success: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) id_list_count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reason: Option<EndReason>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) sdk_region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) config_name: Option<String>,

    #[serde(rename = "markerID", skip_serializing_if = "Option::is_none")]
    pub(crate) marker_id: Option<String>,
}

impl Marker {
    /// Bare marker with no payload fields set
    pub(crate) fn new(
        key: MarkerKey,
        step: Option<MarkerStep>,
        action: MarkerAction,
        timestamp: i64,
    ) -> Self {
        Self {
            key,
            action,
            timestamp,
            step,
            status_code: None,
            error: None,
            success: None,
            url: None,
            id_list_count: None,
            reason: None,
            sdk_region: None,
            config_name: None,
            marker_id: None,
        }
    }

    /// Marker carrying the fields of `payload`
    pub(crate) fn with_payload<P: MarkerPayload>(
        key: MarkerKey,
        step: Option<MarkerStep>,
        action: MarkerAction,
        timestamp: i64,
        payload: P,
    ) -> Self {
        let mut marker = Self::new(key, step, action, timestamp);
        payload.apply(&mut marker);
        marker
    }

    pub fn key(&self) -> MarkerKey {
        self.key
    }

    pub fn action(&self) -> MarkerAction {
        self.action
    }

    /// Milliseconds since the Unix epoch
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn step(&self) -> Option<MarkerStep> {
        self.step
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn error(&self) -> Option<&NetworkErrorInfo> {
        self.error.as_ref()
    }

    pub fn success(&self) -> Option<bool> {
        self.success
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn id_list_count(&self) -> Option<usize> {
        self.id_list_count
    }

    pub fn reason(&self) -> Option<EndReason> {
        self.reason
    }

    pub fn sdk_region(&self) -> Option<&str> {
        self.sdk_region.as_deref()
    }

    pub fn config_name(&self) -> Option<&str> {
        self.config_name.as_deref()
    }

    pub fn marker_id(&self) -> Option<&str> {
        self.marker_id.as_deref()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A payload schema that knows which marker fields it fills
///
/// Sealed: only the stage payloads in this module implement it.
pub trait MarkerPayload: sealed::Sealed {
    fn apply(self, marker: &mut Marker);
}

macro_rules! seal_payloads {
    ($($payload:ty),* $(,)?) => {
        $(impl sealed::Sealed for $payload {})*
    };
}

seal_payloads!(
    NoPayload,
    OverallEnd,
    OutcomeEnd,
    NetworkRequestEnd,
    IdListSourcesStart,
    MarkerIdStart,
    MarkerIdEnd,
    IdListRequestStart,
    IdListRequestEnd,
    ApiCallStart,
    ApiCallEnd,
);

/// Stage that records no fields beyond key, action and timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPayload;

impl MarkerPayload for NoPayload {
    fn apply(self, _marker: &mut Marker) {}
}

/// End of the whole initialization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverallEnd {
    pub success: bool,
    pub error: Option<NetworkErrorInfo>,
    pub reason: Option<EndReason>,
}

impl OverallEnd {
    pub fn success() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn timed_out() -> Self {
        Self {
            success: false,
            reason: Some(EndReason::Timeout),
            ..Default::default()
        }
    }
}

impl MarkerPayload for OverallEnd {
    fn apply(self, marker: &mut Marker) {
        marker.success = Some(self.success);
        marker.error = self.error;
        marker.reason = self.reason;
    }
}

/// End of a local processing step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeEnd {
    pub success: bool,
}

impl OutcomeEnd {
    pub fn new(success: bool) -> Self {
        Self { success }
    }
}

impl MarkerPayload for OutcomeEnd {
    fn apply(self, marker: &mut Marker) {
        marker.success = Some(self.success);
    }
}

/// End of a config-spec or id-list-source network request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkRequestEnd {
    pub success: bool,
    pub status_code: Option<u16>,
    pub sdk_region: Option<String>,
    pub error: Option<NetworkErrorInfo>,
}

impl MarkerPayload for NetworkRequestEnd {
    fn apply(self, marker: &mut Marker) {
        marker.success = Some(self.success);
        marker.status_code = self.status_code;
        marker.sdk_region = self.sdk_region;
        marker.error = self.error;
    }
}

/// Start of id-list-source processing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdListSourcesStart {
    pub id_list_count: usize,
}

impl MarkerPayload for IdListSourcesStart {
    fn apply(self, marker: &mut Marker) {
        marker.id_list_count = Some(self.id_list_count);
    }
}

/// Start of a stage correlated by marker id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerIdStart {
    pub marker_id: String,
}

impl MarkerIdStart {
    pub fn new(marker_id: impl Into<String>) -> Self {
        Self {
            marker_id: marker_id.into(),
        }
    }
}

impl MarkerPayload for MarkerIdStart {
    fn apply(self, marker: &mut Marker) {
        marker.marker_id = Some(self.marker_id);
    }
}

/// End of a stage correlated by marker id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerIdEnd {
    pub success: bool,
    pub marker_id: String,
}

impl MarkerIdEnd {
    pub fn new(success: bool, marker_id: impl Into<String>) -> Self {
        Self {
            success,
            marker_id: marker_id.into(),
        }
    }
}

impl MarkerPayload for MarkerIdEnd {
    fn apply(self, marker: &mut Marker) {
        marker.success = Some(self.success);
        marker.marker_id = Some(self.marker_id);
    }
}

/// Start of a single id list download
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdListRequestStart {
    pub marker_id: String,
    pub url: Option<String>,
}

impl MarkerPayload for IdListRequestStart {
    fn apply(self, marker: &mut Marker) {
        marker.marker_id = Some(self.marker_id);
        marker.url = self.url;
    }
}

/// End of a single id list download
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdListRequestEnd {
    pub success: bool,
    pub status_code: Option<u16>,
    pub sdk_region: Option<String>,
    pub marker_id: String,
}

impl MarkerPayload for IdListRequestEnd {
    fn apply(self, marker: &mut Marker) {
        marker.success = Some(self.success);
        marker.status_code = self.status_code;
        marker.sdk_region = self.sdk_region;
        marker.marker_id = Some(self.marker_id);
    }
}

/// Start of a public API evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiCallStart {
    pub marker_id: String,
    pub config_name: String,
}

impl ApiCallStart {
    pub fn new(marker_id: impl Into<String>, config_name: impl Into<String>) -> Self {
        Self {
            marker_id: marker_id.into(),
            config_name: config_name.into(),
        }
    }
}

impl MarkerPayload for ApiCallStart {
    fn apply(self, marker: &mut Marker) {
        marker.marker_id = Some(self.marker_id);
        marker.config_name = Some(self.config_name);
    }
}

/// End of a public API evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiCallEnd {
    pub success: bool,
    pub marker_id: String,
    pub config_name: String,
}

impl ApiCallEnd {
    pub fn new(
        success: bool,
        marker_id: impl Into<String>,
        config_name: impl Into<String>,
    ) -> Self {
        Self {
            success,
            marker_id: marker_id.into(),
            config_name: config_name.into(),
        }
    }
}

impl MarkerPayload for ApiCallEnd {
    fn apply(self, marker: &mut Marker) {
        marker.success = Some(self.success);
        marker.marker_id = Some(self.marker_id);
        marker.config_name = Some(self.config_name);
    }
}
