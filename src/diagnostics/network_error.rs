// src/diagnostics/network_error.rs
//! Normalization of arbitrary error values for marker payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error details attached to a failed request marker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkErrorInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
}

/// Pick `code`, `name` and `message` from an error value
///
/// Returns `None` unless `err` is an object. Fields missing from the object
/// stay `None` individually.
pub fn format_network_error(err: &Value) -> Option<NetworkErrorInfo> {
    let object = err.as_object()?;

    Some(NetworkErrorInfo {
        code: object.get("code").cloned(),
        name: object.get("name").cloned(),
        message: object.get("message").cloned(),
    })
}

impl NetworkErrorInfo {
    /// Build from a Rust error, using its type name and display text
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let name = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            code: None,
            name: Some(Value::String(name)),
            message: Some(Value::String(err.to_string())),
        }
    }
}
