// src/diagnostics/context.rs
//! Marker contexts and the shared "current context" value

use crate::utils::errors::DiagnosticsError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Operation category a marker is grouped under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerContext {
    Initialize,
    ConfigSync,
    EventLogging,
    ApiCall,
    GetClientInitializeResponse,
}

impl MarkerContext {
    /// Every context, in buffer order
    pub const ALL: [MarkerContext; 5] = [
        MarkerContext::Initialize,
        MarkerContext::ConfigSync,
        MarkerContext::EventLogging,
        MarkerContext::ApiCall,
        MarkerContext::GetClientInitializeResponse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerContext::Initialize => "initialize",
            MarkerContext::ConfigSync => "config_sync",
            MarkerContext::EventLogging => "event_logging",
            MarkerContext::ApiCall => "api_call",
            MarkerContext::GetClientInitializeResponse => "get_client_initialize_response",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            MarkerContext::Initialize => 0,
            MarkerContext::ConfigSync => 1,
            MarkerContext::EventLogging => 2,
            MarkerContext::ApiCall => 3,
            MarkerContext::GetClientInitializeResponse => 4,
        }
    }
}

impl fmt::Display for MarkerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkerContext {
    type Err = DiagnosticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkerContext::ALL
            .into_iter()
            .find(|ctx| ctx.as_str() == s)
            .ok_or_else(|| DiagnosticsError::UnknownContext(s.to_string()))
    }
}

/// Default context for markers recorded without an explicit override
#[derive(Debug)]
pub struct ContextState {
    current: RwLock<MarkerContext>,
}

impl ContextState {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(MarkerContext::Initialize),
        }
    }

    pub fn set(&self, context: MarkerContext) {
        trace!("Diagnostics context set to {}", context);
        *self.current.write() = context;
    }

    pub fn get(&self) -> MarkerContext {
        *self.current.read()
    }

    /// Explicit override wins over the stored default
    pub fn resolve(&self, override_context: Option<MarkerContext>) -> MarkerContext {
        override_context.unwrap_or_else(|| self.get())
    }
}

impl Default for ContextState {
    fn default() -> Self {
        Self::new()
    }
}
