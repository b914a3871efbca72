//! Per-call options.
//!
//! Callers pass [`RequestOptions`] (every field optional); the pre-send stage
//! merges them over the configured [`RequestDefaults`] into a concrete
//! [`CallOptions`]. Caller values always win.

use std::fmt;
use std::time::Duration;

use crate::capabilities::MaskTarget;
use crate::config::schema::{DefaultsConfig, OrchestratorConfig};
use crate::lifecycle::cancel::Canceller;

/// Callback receiving the manual cancel for a call.
pub type CancelExposer = Box<dyn FnOnce(Canceller) + Send>;

/// Defaults every call starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub messages: DefaultsConfig,
    pub timeout: Duration,
}

impl RequestDefaults {
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self {
            messages: config.defaults.clone(),
            timeout: config.transport.timeout(),
        }
    }
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self::from_config(&OrchestratorConfig::default())
    }
}

/// Caller overrides for one call.
#[derive(Default)]
pub struct RequestOptions {
    /// Keep this call alive across bulk cancellation.
    pub auto_cancel_exempt: Option<bool>,
    /// Busy overlay shown while the call is in flight.
    pub mask: Option<MaskTarget>,
    pub error_message: Option<String>,
    pub success_message: Option<String>,
    /// Suppress success and failure notifications.
    pub silent: Option<bool>,
    pub timeout: Option<Duration>,
    on_cancel: Option<CancelExposer>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exempt_from_auto_cancel(mut self) -> Self {
        self.auto_cancel_exempt = Some(true);
        self
    }

    pub fn mask(mut self, target: impl Into<String>) -> Self {
        self.mask = Some(MaskTarget::new(target));
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = Some(silent);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Receive a [`Canceller`] for this call before it is dispatched.
    pub fn on_cancel(mut self, expose: impl FnOnce(Canceller) + Send + 'static) -> Self {
        self.on_cancel = Some(Box::new(expose));
        self
    }

    /// Merge over `defaults`, splitting off the cancellation callback.
    pub(crate) fn merge(self, defaults: &RequestDefaults) -> (CallOptions, Option<CancelExposer>) {
        let messages = &defaults.messages;
        let options = CallOptions {
            auto_cancel_exempt: self.auto_cancel_exempt.unwrap_or(messages.auto_cancel_exempt),
            mask: self.mask,
            error_message: self.error_message.unwrap_or_else(|| messages.error_message.clone()),
            success_message: self
                .success_message
                .unwrap_or_else(|| messages.success_message.clone()),
            silent: self.silent.unwrap_or(messages.silent),
            timeout: self.timeout.unwrap_or(defaults.timeout),
        };
        (options, self.on_cancel)
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("auto_cancel_exempt", &self.auto_cancel_exempt)
            .field("mask", &self.mask)
            .field("error_message", &self.error_message)
            .field("success_message", &self.success_message)
            .field("silent", &self.silent)
            .field("timeout", &self.timeout)
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

/// Options in force for one call after merging.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOptions {
    pub auto_cancel_exempt: bool,
    pub mask: Option<MaskTarget>,
    pub error_message: String,
    pub success_message: String,
    pub silent: bool,
    pub timeout: Duration,
}

impl Default for CallOptions {
    fn default() -> Self {
        RequestOptions::default().merge(&RequestDefaults::default()).0
    }
}
