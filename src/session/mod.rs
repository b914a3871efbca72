//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! failure response (status, payload)
//!     → guardian.rs (401 or unauthorized code? on login surface? already prompted?)
//!     → dialog.rs (blocking, non-dismissable re-login prompt)
//!     → on submit: LoginFlow::end_session, then LoginFlow::redirect_to_login
//! ```

pub mod dialog;
pub mod guardian;

pub use dialog::{DialogButton, DialogIcon, ReauthDialog, SubmitAction};
pub use guardian::SessionGuardian;
