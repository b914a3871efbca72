//! Injected side-effect capabilities.
//!
//! The pipeline never talks to a UI toolkit or an auth store directly; it
//! calls these strategy traits:
//! - [`Mask`]: show / hide a busy overlay on a target
//! - [`Notifier`]: success / failure toasts
//! - [`Dialog`]: blocking confirmation with a submit action
//! - [`TokenSource`]: the current credential
//! - [`LoginFlow`]: end the session and navigate to login
//! - [`RouteContext`]: whether the caller is already on the login surface
//!
//! [`Capabilities::default`] wires tracing-backed and no-op implementations
//! suitable for headless use.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};

use crate::session::dialog::{ReauthDialog, SubmitAction};

/// Element a busy overlay is drawn over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaskTarget(pub String);

impl MaskTarget {
    pub fn new(target: impl Into<String>) -> Self {
        Self(target.into())
    }
}

impl fmt::Display for MaskTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait Mask: Send + Sync {
    fn show(&self, target: &MaskTarget);
    fn hide(&self, target: &MaskTarget);
}

pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn failure(&self, message: &str);
}

pub trait Dialog: Send + Sync {
    /// Present `dialog`; run `on_submit` once the user confirms.
    fn confirm(&self, dialog: ReauthDialog, on_submit: SubmitAction);
}

pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

pub trait LoginFlow: Send + Sync {
    /// Tell the backend the session is over. May fail.
    fn end_session(&self) -> BoxFuture<'_, Result<(), String>>;

    /// Navigate to the login flow.
    fn redirect_to_login(&self);
}

pub trait RouteContext: Send + Sync {
    fn on_login_surface(&self) -> bool;
}

/// Logs every UI side effect through tracing.
///
/// Confirmation dialogs are logged and never submitted: a headless process
/// has nobody to acknowledge them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingUi;

impl Mask for TracingUi {
    fn show(&self, target: &MaskTarget) {
        tracing::debug!(mask = %target, "Mask shown");
    }

    fn hide(&self, target: &MaskTarget) {
        tracing::debug!(mask = %target, "Mask hidden");
    }
}

impl Notifier for TracingUi {
    fn success(&self, message: &str) {
        tracing::info!(notification = message, "Success notification");
    }

    fn failure(&self, message: &str) {
        tracing::warn!(notification = message, "Failure notification");
    }
}

impl Dialog for TracingUi {
    fn confirm(&self, dialog: ReauthDialog, _on_submit: SubmitAction) {
        tracing::warn!(title = %dialog.title, body = %dialog.message, "Confirmation required");
    }
}

/// Fixed credential.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Login flow with nothing to tear down; redirect is logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogin;

impl LoginFlow for NoopLogin {
    fn end_session(&self) -> BoxFuture<'_, Result<(), String>> {
        future::ready(Ok(())).boxed()
    }

    fn redirect_to_login(&self) {
        tracing::info!("Redirect to login requested");
    }
}

/// Route context backed by a flag the router flips on navigation.
#[derive(Debug, Default)]
pub struct LoginSurfaceFlag(AtomicBool);

impl LoginSurfaceFlag {
    pub fn new(on_login_surface: bool) -> Self {
        Self(AtomicBool::new(on_login_surface))
    }

    pub fn set(&self, on_login_surface: bool) {
        self.0.store(on_login_surface, Ordering::SeqCst);
    }
}

impl RouteContext for LoginSurfaceFlag {
    fn on_login_surface(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Every capability the pipeline depends on.
#[derive(Clone)]
pub struct Capabilities {
    pub mask: Arc<dyn Mask>,
    pub notifier: Arc<dyn Notifier>,
    pub dialog: Arc<dyn Dialog>,
    pub tokens: Arc<dyn TokenSource>,
    pub login: Arc<dyn LoginFlow>,
    pub route: Arc<dyn RouteContext>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            mask: Arc::new(TracingUi),
            notifier: Arc::new(TracingUi),
            dialog: Arc::new(TracingUi),
            tokens: Arc::new(StaticToken(None)),
            login: Arc::new(NoopLogin),
            route: Arc::new(LoginSurfaceFlag::default()),
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}
