//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline, registry, session guardian produce:
//!     → logging.rs (structured events keyed by request_id)
//!     → metrics.rs (counters, gauges, histograms)
//! ```

pub mod logging;
pub mod metrics;
