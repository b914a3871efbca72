//! HTTP request lifecycle orchestration.
//!
//! Sits between application code and an HTTP transport: every call goes
//! through a pre-send / post-receive interceptor pipeline, is tracked in a
//! cancellable registry, and resolves to a uniform [`ResultEnvelope`].

pub mod capabilities;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod session;

pub use config::schema::OrchestratorConfig;
pub use http::envelope::ResultEnvelope;
pub use http::method::Method;
pub use lifecycle::registry::RequestRegistry;
pub use pipeline::{Pipeline, RequestOptions};
pub use session::SessionGuardian;
