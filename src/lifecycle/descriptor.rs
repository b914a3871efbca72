//! In-flight request descriptors.

use serde::Serialize;

use crate::http::method::Method;
use crate::http::request::RequestId;
use crate::lifecycle::cancel::CancelHandle;
use crate::pipeline::options::CallOptions;

/// One tracked call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub handle: CancelHandle,
    pub method: Method,
    pub url: String,
    pub options: CallOptions,
}

impl RequestDescriptor {
    pub fn new(handle: CancelHandle, method: Method, url: impl Into<String>, options: CallOptions) -> Self {
        Self {
            handle,
            method,
            url: url.into(),
            options,
        }
    }

    pub fn summary(&self) -> TrackedRequest {
        TrackedRequest {
            id: self.handle.id(),
            method: self.method,
            url: self.url.clone(),
            auto_cancel_exempt: self.options.auto_cancel_exempt,
        }
    }
}

/// Diagnostic view of a tracked call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedRequest {
    pub id: RequestId,
    pub method: Method,
    pub url: String,
    pub auto_cancel_exempt: bool,
}
