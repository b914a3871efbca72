//! Interceptor pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! caller: get/head/post/patch/put(url, data, options)
//!     → options.rs (merge caller overrides over defaults)
//!     → interceptors.rs pre-send (mask, cancel handle, URL, query/body, register)
//!     → Transport::send wrapped in Abortable
//!     → interceptors.rs post-receive
//!         success   → normalise → Ok(envelope)
//!         failure   → session guardian → Err(envelope)
//!         cancelled → Err(envelope with cancel reason)
//! ```
//!
//! # Design Decisions
//! - Every rejection is a `ResultEnvelope`, never a transport error type
//! - UI side effects go through injected capabilities only
//! - Defaults live behind `ArcSwap` so they can be reloaded without locking calls

pub mod client;
pub mod error;
pub(crate) mod interceptors;
pub mod options;

pub use client::Pipeline;
pub use error::{PipelineError, PipelineResult};
pub use options::{CallOptions, CancelExposer, RequestDefaults, RequestOptions};
