// src/diagnostics/sampling.rs
//! Per-type sampling of diagnostics emission
//!
//! Rates are integers out of [`MAX_SAMPLING_RATE`]. A draw in
//! `[0, MAX_SAMPLING_RATE)` below the stored rate means "emit". The random
//! source is a trait object so tests can pin the draw.

use crate::utils::errors::DiagnosticsError;
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Upper bound of every sampling rate (always emit)
pub const MAX_SAMPLING_RATE: u32 = 10_000;

/// Emission-decision key, each mapped to one stored rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticsType {
    IdList,
    ConfigSpec,
    Initialize,
    ApiCall,
    GetClientInitializeResponse,
}

impl DiagnosticsType {
    pub const ALL: [DiagnosticsType; 5] = [
        DiagnosticsType::IdList,
        DiagnosticsType::ConfigSpec,
        DiagnosticsType::Initialize,
        DiagnosticsType::ApiCall,
        DiagnosticsType::GetClientInitializeResponse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticsType::IdList => "id_list",
            DiagnosticsType::ConfigSpec => "config_spec",
            DiagnosticsType::Initialize => "initialize",
            DiagnosticsType::ApiCall => "api_call",
            DiagnosticsType::GetClientInitializeResponse => "get_client_initialize_response",
        }
    }
}

impl fmt::Display for DiagnosticsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagnosticsType {
    type Err = DiagnosticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiagnosticsType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| DiagnosticsError::UnknownDiagnosticsType(s.to_string()))
    }
}

/// The six stored rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingRates {
    pub dcs: u32,
    pub log: u32,
    pub idlist: u32,
    pub initialize: u32,
    pub api_call: u32,
    pub gcir: u32,
}

impl Default for SamplingRates {
    fn default() -> Self {
        Self {
            dcs: 0,
            log: 0,
            idlist: 0,
            initialize: MAX_SAMPLING_RATE,
            api_call: 0,
            gcir: 0,
        }
    }
}

impl SamplingRates {
    pub fn rate_for(&self, ty: DiagnosticsType) -> u32 {
        match ty {
            DiagnosticsType::IdList => self.idlist,
            DiagnosticsType::ConfigSpec => self.dcs,
            DiagnosticsType::Initialize => self.initialize,
            DiagnosticsType::ApiCall => self.api_call,
            DiagnosticsType::GetClientInitializeResponse => self.gcir,
        }
    }

    /// Copy with every numeric field of `input` applied, clamped
    ///
    /// Non-numeric or missing fields keep their current value.
    pub fn merged(&self, input: &serde_json::Map<String, Value>) -> Self {
        let pick = |name: &str, current: u32| -> u32 {
            input
                .get(name)
                .and_then(Value::as_f64)
                .map(clamp_rate)
                .unwrap_or(current)
        };

        Self {
            dcs: pick("dcs", self.dcs),
            log: pick("log", self.log),
            idlist: pick("idlist", self.idlist),
            initialize: pick("initialize", self.initialize),
            api_call: pick("api_call", self.api_call),
            gcir: pick("gcir", self.gcir),
        }
    }
}

fn clamp_rate(value: f64) -> u32 {
    value.clamp(0.0, MAX_SAMPLING_RATE as f64) as u32
}

/// Source of uniform draws in `[0, MAX_SAMPLING_RATE)`
pub trait SampleSource: Send + Sync {
    fn draw(&self) -> u32;
}

/// Draws from the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSource;

impl SampleSource for ThreadRngSource {
    fn draw(&self) -> u32 {
        rand::thread_rng().gen_range(0..MAX_SAMPLING_RATE)
    }
}

/// Always returns the same draw
///
/// For callers that need a deterministic emit/skip decision, such as tests
/// or replaying a recorded session.
#[derive(Debug, Clone, Copy)]
pub struct FixedSampleSource(pub u32);

impl SampleSource for FixedSampleSource {
    fn draw(&self) -> u32 {
        self.0.min(MAX_SAMPLING_RATE - 1)
    }
}

/// Sampling rates plus the random source that evaluates them
pub struct SamplingPolicy {
    rates: RwLock<SamplingRates>,
    source: Box<dyn SampleSource>,
}

impl SamplingPolicy {
    pub fn new() -> Self {
        Self::with_source(Box::new(ThreadRngSource))
    }

    pub fn with_source(source: Box<dyn SampleSource>) -> Self {
        Self {
            rates: RwLock::new(SamplingRates::default()),
            source,
        }
    }

    pub fn set_source(&mut self, source: Box<dyn SampleSource>) {
        self.source = source;
    }

    /// Apply a loosely-typed rate update; non-objects are ignored
    pub fn update(&self, input: &Value) {
        let Some(fields) = input.as_object() else {
            debug!("Ignoring non-object sampling rate update");
            return;
        };

        let mut rates = self.rates.write();
        let next = rates.merged(fields);
        if next != *rates {
            info!(
                dcs = next.dcs,
                log = next.log,
                idlist = next.idlist,
                initialize = next.initialize,
                api_call = next.api_call,
                gcir = next.gcir,
                "Diagnostics sampling rates updated"
            );
        }
        *rates = next;
    }

    pub fn should_log(&self, ty: DiagnosticsType) -> bool {
        let rate = self.rates.read().rate_for(ty);
        let draw = self.source.draw();
        let emit = draw < rate;

        debug!("Sampling {}: draw {} against rate {} -> {}", ty, draw, rate, emit);
        emit
    }

    pub fn rates(&self) -> SamplingRates {
        *self.rates.read()
    }
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SamplingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplingPolicy")
            .field("rates", &self.rates())
            .finish_non_exhaustive()
    }
}
