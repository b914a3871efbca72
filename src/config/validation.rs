//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeout > 0, status in the error range)
//! - Check the base URL is an absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: OrchestratorConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::OrchestratorConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("transport.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("transport.token_header must not be empty")]
    EmptyTokenHeader,

    #[error("transport.cache_buster_param must not be empty")]
    EmptyCacheBuster,

    #[error("transport.base_url '{0}' is not an absolute http(s) URL")]
    InvalidBaseUrl(String),

    #[error("session.unauthorized_status {0} is not a 4xx/5xx status")]
    InvalidUnauthorizedStatus(u16),
}

pub fn validate_config(config: &OrchestratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.transport.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.transport.token_header.trim().is_empty() {
        errors.push(ValidationError::EmptyTokenHeader);
    }
    if config.transport.cache_buster_param.trim().is_empty() {
        errors.push(ValidationError::EmptyCacheBuster);
    }
    if let Some(base) = &config.transport.base_url {
        let valid = Url::parse(base)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidBaseUrl(base.clone()));
        }
    }
    let status = config.session.unauthorized_status;
    if !(400..=599).contains(&status) {
        errors.push(ValidationError::InvalidUnauthorizedStatus(status));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
