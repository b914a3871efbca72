//! Re-login prompt model.

use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::config::schema::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogIcon {
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogButton {
    Submit,
}

/// Blocking confirmation shown when the session has expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReauthDialog {
    pub icon: DialogIcon,
    pub title: String,
    pub message: String,
    /// Always false: the user must acknowledge.
    pub closeable: bool,
    pub buttons: Vec<DialogButton>,
    /// Show a busy state on submit until the action's future completes.
    pub submit_loading: bool,
}

impl ReauthDialog {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            icon: DialogIcon::Warning,
            title: config.dialog_title.clone(),
            message: config.dialog_message.clone(),
            closeable: false,
            buttons: vec![DialogButton::Submit],
            submit_loading: true,
        }
    }
}

/// Action run when the user confirms a dialog.
pub type SubmitAction = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;
