//! Navigation hook for forced logouts.
//!
//! When a session dies mid-request (the refresh token was rejected, or a
//! freshly refreshed token is still refused) the application has to send
//! the user back to the login screen. What "send back" means depends on
//! the host: a router push in a web app, a prompt in a CLI, a window swap
//! in a desktop app.
//!
//! The client doesn't know any of that. It only calls
//! [`Navigator::redirect_to_login`] and lets the host decide.

use tracing::debug;

/// Sends the user to the login screen.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use lms_admin_session::Navigator;
///
/// /// Remembers that a redirect was requested; the UI loop polls it.
/// #[derive(Default)]
/// struct FlagNavigator {
///     pending: AtomicBool,
/// }
///
/// impl Navigator for FlagNavigator {
///     fn redirect_to_login(&self, _route: &str) {
///         self.pending.store(true, Ordering::SeqCst);
///     }
/// }
/// ```
pub trait Navigator: Send + Sync + 'static {
    /// Called once per forced logout with the configured login route.
    ///
    /// Runs on whatever task observed the failure, so it must not block.
    fn redirect_to_login(&self, route: &str);
}

/// A navigator that only logs. Used when the host has no screens to switch.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_login(&self, route: &str) {
        debug!(%route, "login redirect requested, no navigator installed");
    }
}
