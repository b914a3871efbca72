//! Backend shape normalisation.
//!
//! Backends answer in two shapes:
//! - bare resource data (single items or `{ items: [...] }` lists), only ever
//!   returned by successful reads;
//! - a status envelope `{ status, code, msg }`, returned by every write and
//!   by failed reads.
//!
//! [`normalize`] folds both into one [`ResultEnvelope`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend field carrying the outcome marker.
pub const STATUS_FIELD: &str = "status";
/// Backend field carrying the human-readable message.
pub const MESSAGE_FIELD: &str = "msg";
/// Backend field carrying the machine-readable error code.
pub const CODE_FIELD: &str = "code";
/// Value of [`STATUS_FIELD`] that marks success.
pub const SUCCESS_MARKER: &str = "Success";

/// Uniform result handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub success: bool,

    /// Resource data of a successful read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResultEnvelope {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Normalise a backend payload.
///
/// `is_read` is true for simple verbs. A read whose payload has no status
/// field is an implicit success; everything else is judged by its marker.
pub fn normalize(payload: &Value, is_read: bool) -> ResultEnvelope {
    let status = field(payload, STATUS_FIELD);

    if is_read && status.is_none() {
        return ResultEnvelope::ok(payload.clone());
    }

    ResultEnvelope {
        success: status.and_then(Value::as_str) == Some(SUCCESS_MARKER),
        data: None,
        message: backend_message(payload),
    }
}

/// The backend-supplied message, if the payload carries a non-empty one.
pub fn backend_message(payload: &Value) -> Option<String> {
    match field(payload, MESSAGE_FIELD)? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// The backend error code, if present as a string.
pub fn backend_code(payload: &Value) -> Option<&str> {
    field(payload, CODE_FIELD).and_then(Value::as_str)
}

// Missing, null, false and "" all count as absent.
fn field<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    match payload.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        v => Some(v),
    }
}
