//! Request registry.
//!
//! # Responsibilities
//! - Track every call from pre-send until its outcome is resolved
//! - Remove calls by cancellation-handle identity
//! - Bulk-cancel every call that is not exempt from auto-cancellation
//!
//! # Design Decisions
//! - One `Mutex<Vec<_>>`: each operation is a single critical section, so
//!   register / deregister / cancel_all never interleave
//! - Removal is idempotent; a handle firing after natural completion is safe
//! - Owned and injected (`Arc<RequestRegistry>`), never a global

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::lifecycle::cancel::CancelHandle;
use crate::lifecycle::descriptor::{RequestDescriptor, TrackedRequest};
use crate::observability::metrics;

/// The set of in-flight calls.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    entries: Mutex<Vec<RequestDescriptor>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // The tracked set is plain data; a panic elsewhere cannot leave it torn.
    fn entries(&self) -> MutexGuard<'_, Vec<RequestDescriptor>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start tracking a call.
    pub fn register(&self, descriptor: RequestDescriptor) {
        let mut entries = self.entries();
        tracing::debug!(
            request_id = %descriptor.handle.id(),
            method = %descriptor.method,
            url = %descriptor.url,
            "Request registered"
        );
        entries.push(descriptor);
        metrics::record_in_flight(entries.len());
    }

    /// Start tracking a call for as long as the returned guard lives.
    pub fn track(self: &Arc<Self>, descriptor: RequestDescriptor) -> TrackingGuard {
        let handle = descriptor.handle.clone();
        self.register(descriptor);
        TrackingGuard {
            registry: Arc::clone(self),
            handle,
        }
    }

    /// Stop tracking every call bound to `handle`.
    ///
    /// Returns how many entries were removed; zero when already gone.
    pub fn deregister(&self, handle: &CancelHandle) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|d| d.handle != *handle);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(request_id = %handle.id(), "Request deregistered");
            metrics::record_in_flight(entries.len());
        }
        removed
    }

    /// Abort and remove every call that is not auto-cancel exempt.
    ///
    /// Exempt calls stay tracked and keep running. Returns how many calls
    /// were cancelled.
    pub fn cancel_all(&self, reason: Option<&str>) -> usize {
        let mut entries = self.entries();
        let mut cancelled = 0;
        entries.retain(|d| {
            if d.options.auto_cancel_exempt {
                return true;
            }
            d.handle.cancel(reason);
            cancelled += 1;
            false
        });

        if cancelled > 0 {
            tracing::info!(cancelled, remaining = entries.len(), "Bulk-cancelled pending requests");
            metrics::record_cancelled("bulk", cancelled);
            metrics::record_in_flight(entries.len());
        }
        cancelled
    }

    pub fn contains(&self, handle: &CancelHandle) -> bool {
        self.entries().iter().any(|d| d.handle == *handle)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Point-in-time view of the tracked calls, in registration order.
    pub fn snapshot(&self) -> Vec<TrackedRequest> {
        self.entries().iter().map(RequestDescriptor::summary).collect()
    }
}

/// Deregisters its call when dropped.
///
/// Held by the call's future, so a call abandoned mid-flight (timeout,
/// `select!`, task abort) leaves the registry too.
#[derive(Debug)]
pub struct TrackingGuard {
    registry: Arc<RequestRegistry>,
    handle: CancelHandle,
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        self.registry.deregister(&self.handle);
    }
}
