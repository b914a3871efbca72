//! Session-expiry detection.
//!
//! # Responsibilities
//! - Recognise an expired session from the HTTP status or the backend code
//! - Present one blocking re-login prompt
//! - Redirect to login once the user confirms, even if ending the session fails
//!
//! # Design Decisions
//! - Whether the caller is already on the login surface is a parameter,
//!   supplied by the caller's routing context
//! - One-shot: after a prompt, further triggers are ignored until `reset`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value;

use crate::capabilities::{Dialog, LoginFlow};
use crate::config::schema::SessionConfig;
use crate::http::envelope::backend_code;
use crate::observability::metrics;
use crate::session::dialog::{ReauthDialog, SubmitAction};

pub struct SessionGuardian {
    config: SessionConfig,
    dialog: Arc<dyn Dialog>,
    login: Arc<dyn LoginFlow>,
    prompted: AtomicBool,
}

impl SessionGuardian {
    pub fn new(config: SessionConfig, dialog: Arc<dyn Dialog>, login: Arc<dyn LoginFlow>) -> Self {
        Self {
            config,
            dialog,
            login,
            prompted: AtomicBool::new(false),
        }
    }

    /// True when `status` or the payload's error code marks an expired session.
    pub fn is_unauthorized(&self, status: u16, payload: &Value) -> bool {
        if self.config.match_status && status == self.config.unauthorized_status {
            return true;
        }
        backend_code(payload)
            .map(|code| self.config.unauthorized_codes.iter().any(|c| c == code))
            .unwrap_or(false)
    }

    /// Inspect a failure response and prompt for re-login if needed.
    ///
    /// Returns true if the prompt was presented by this call.
    pub fn guard(&self, status: u16, payload: &Value, on_login_surface: bool) -> bool {
        if !self.is_unauthorized(status, payload) {
            return false;
        }
        if on_login_surface {
            tracing::debug!(status, "Session expired on login surface, prompt suppressed");
            return false;
        }
        if self.prompted.swap(true, Ordering::SeqCst) {
            tracing::debug!(status, "Re-login prompt already pending");
            return false;
        }

        tracing::warn!(status, code = ?backend_code(payload), "Session expired, prompting re-login");
        metrics::record_reauth_prompt();
        self.dialog
            .confirm(ReauthDialog::from_config(&self.config), self.submit_action());
        true
    }

    /// Allow the next expiry to prompt again (after a fresh login).
    pub fn reset(&self) {
        self.prompted.store(false, Ordering::SeqCst);
    }

    pub fn is_prompt_pending(&self) -> bool {
        self.prompted.load(Ordering::SeqCst)
    }

    fn submit_action(&self) -> SubmitAction {
        let login = Arc::clone(&self.login);
        Box::new(move || {
            async move {
                if let Err(e) = login.end_session().await {
                    tracing::warn!(error = %e, "Ending session failed, redirecting anyway");
                }
                login.redirect_to_login();
            }
            .boxed()
        })
    }
}
