//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files, and
//! every field has a default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Transport settings (base URL, deadline, credential header).
    pub transport: TransportConfig,

    /// Per-call option defaults.
    pub defaults: DefaultsConfig,

    /// Session-expiry detection and the re-login prompt.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Absolute URL relative call paths are joined onto.
    pub base_url: Option<String>,

    /// Overall call deadline in seconds.
    pub timeout_secs: u64,

    /// Header carrying the credential from the token source.
    pub token_header: String,

    /// Query parameter added to simple verbs to defeat caches.
    pub cache_buster_param: String,
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 60,
            token_header: "csrf_id".to_string(),
            cache_buster_param: "t".to_string(),
        }
    }
}

/// Defaults merged under every call's options.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Failure notification when the backend gives no message.
    pub error_message: String,

    /// Success notification.
    pub success_message: String,

    /// Suppress notifications.
    pub silent: bool,

    /// Exclude calls from bulk cancellation.
    pub auto_cancel_exempt: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            error_message: "Request failed".to_string(),
            success_message: "Operation succeeded".to_string(),
            silent: false,
            auto_cancel_exempt: false,
        }
    }
}

/// Session guardian configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// HTTP status that signals an expired session.
    pub unauthorized_status: u16,

    /// Treat `unauthorized_status` as a trigger. When false only the
    /// backend codes below trigger the prompt.
    pub match_status: bool,

    /// Backend error codes that signal an expired session.
    pub unauthorized_codes: Vec<String>,

    /// Title of the re-login prompt.
    pub dialog_title: String,

    /// Body of the re-login prompt.
    pub dialog_message: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            unauthorized_status: 401,
            match_status: true,
            unauthorized_codes: vec!["ERR_M001_UNAUTHORIZED".to_string(), "NO_ACCESS".to_string()],
            dialog_title: "Please log in again".to_string(),
            dialog_message: "The session has been idle longer than allowed. \
                             To keep the system secure, please log in again."
                .to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
