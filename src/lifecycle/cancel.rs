//! Cancellation handles.
//!
//! # Responsibilities
//! - Bind a one-shot abort to exactly one in-flight call
//! - Remember why the call was cancelled
//! - Give calling code a manual cancel that keeps registry bookkeeping intact
//!
//! # Design Decisions
//! - Built on `futures_util::future::AbortHandle`: aborting twice, or after
//!   the call already finished, is a no-op
//! - Identity is the request ID, not the URL; two calls to the same URL have
//!   independent handles

use std::sync::{Arc, OnceLock};

use futures_util::future::{AbortHandle, AbortRegistration};

use crate::http::request::RequestId;
use crate::lifecycle::registry::RequestRegistry;
use crate::observability::metrics;

/// One-shot abort for a single call.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    id: RequestId,
    abort: AbortHandle,
    reason: Arc<OnceLock<Option<String>>>,
}

impl CancelHandle {
    /// Create a handle and the registration that ties it to a future.
    pub fn new(id: RequestId) -> (Self, AbortRegistration) {
        let (abort, registration) = AbortHandle::new_pair();
        let handle = Self {
            id,
            abort,
            reason: Arc::new(OnceLock::new()),
        };
        (handle, registration)
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Abort the call.
    ///
    /// Only the first call records its reason. Returns true if this call was
    /// the one that fired the handle.
    pub fn cancel(&self, reason: Option<&str>) -> bool {
        let first = self.reason.set(reason.map(str::to_owned)).is_ok();
        self.abort.abort();
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason.get().is_some()
    }

    /// Reason given when the handle fired, if any.
    pub fn reason(&self) -> Option<&str> {
        self.reason.get().and_then(|r| r.as_deref())
    }
}

impl PartialEq for CancelHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CancelHandle {}

impl std::hash::Hash for CancelHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Manual cancel handed to calling code through `RequestOptions::on_cancel`.
///
/// Firing it aborts the call and removes it from the registry in one step.
#[derive(Debug, Clone)]
pub struct Canceller {
    handle: CancelHandle,
    registry: Arc<RequestRegistry>,
}

impl Canceller {
    pub(crate) fn new(handle: CancelHandle, registry: Arc<RequestRegistry>) -> Self {
        Self { handle, registry }
    }

    pub fn id(&self) -> RequestId {
        self.handle.id()
    }

    pub fn cancel(&self, reason: Option<&str>) {
        if self.handle.cancel(reason) {
            metrics::record_cancelled("manual", 1);
        }
        self.registry.deregister(&self.handle);
        tracing::debug!(request_id = %self.handle.id(), "Request cancelled by caller");
    }
}
