//! Pipeline error definitions.

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::http::transport::TransportError;

/// Errors raised before a call is dispatched, or while building a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The composed URL could not be parsed or resolved.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The credential header could not be encoded.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Simple verbs carry their data as query parameters.
    #[error("query data for simple verbs must be a JSON object, got {0}")]
    InvalidQuery(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type for pipeline construction.
pub type PipelineResult<T> = Result<T, PipelineError>;
