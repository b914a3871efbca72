//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! caller (url, data)
//!     → url.rs (compose resource-addressed path)
//!     → request.rs (request ID, query/body, headers, deadline)
//!     → transport.rs (round trip over reqwest)
//!     → response.rs (status + buffered body)
//!     → envelope.rs (normalise backend shape into ResultEnvelope)
//! ```

pub mod envelope;
pub mod method;
pub mod request;
pub mod response;
pub mod transport;
pub mod url;

pub use envelope::{normalize, ResultEnvelope};
pub use method::Method;
pub use request::{RequestId, TransportRequest, X_REQUEST_ID};
pub use response::TransportResponse;
pub use transport::{ReqwestTransport, Transport, TransportError};
