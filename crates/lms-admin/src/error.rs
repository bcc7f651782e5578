//! Unified error type for the LMS admin client.

use lms_admin_protocol::ProtocolError;
use lms_admin_session::SessionError;
use lms_admin_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each wrapping variant auto-generates `From`
/// impls, so the `?` operator converts sub-crate errors automatically.
///
/// Application-level failures (`success: false` in the envelope) are NOT
/// errors. They come back as a normal
/// [`ApiResponse`](lms_admin_protocol::ApiResponse) for the caller to show.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No usable response came back (unreachable, timed out).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A body couldn't be encoded, or a response wasn't a valid envelope.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A new session couldn't be persisted.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The server rejected the session and it couldn't be refreshed. The
    /// local session has been cleared and the navigator told to show the
    /// login screen.
    #[error("session expired, please sign in again")]
    SessionExpired,

    /// Login was refused. Carries the server's message verbatim.
    #[error("{0}")]
    AuthFailed(String),

    /// The operation needs a signed-in session and there isn't one.
    #[error("not authenticated")]
    NotAuthenticated,
}

impl ClientError {
    /// `true` when the user has to sign in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
