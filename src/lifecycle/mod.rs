//! Request lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! pre-send:
//!     cancel.rs (CancelHandle + AbortRegistration)
//!     → descriptor.rs (handle, method, url, merged options)
//!     → registry.rs (register)
//!
//! post-receive (success, failure), manual cancel, or the call's future dropped:
//!     → registry.rs (deregister by handle identity)
//!
//! bulk cancel (e.g. navigation away):
//!     → registry.rs (fire every non-exempt handle, remove it)
//! ```
//!
//! # Design Decisions
//! - Manual and bulk cancellation fire the same `AbortHandle`
//! - Both cancellation paths deregister; natural completion deregisters too
//! - The registry is the only shared mutable state in the crate

pub mod cancel;
pub mod descriptor;
pub mod registry;

pub use cancel::{CancelHandle, Canceller};
pub use descriptor::{RequestDescriptor, TrackedRequest};
pub use registry::{RequestRegistry, TrackingGuard};
