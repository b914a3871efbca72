//! Outgoing request as handed to the transport.
//!
//! # Responsibilities
//! - Carry the fully composed call (URL, query, headers, body, deadline)
//! - Identify each call with a unique request ID
//!
//! # Design Decisions
//! - Request ID is generated in the pre-send stage and forwarded as a header
//! - Query and body are mutually exclusive: simple verbs use the query only

use std::fmt;
use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::http::method::Method;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Unique identifier of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A call ready for dispatch.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub id: RequestId,
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    /// Overall deadline for the round trip.
    pub timeout: Duration,
}
