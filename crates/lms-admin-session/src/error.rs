//! Error types for the session layer.

/// Errors that can occur while persisting session state.
///
/// Reads never fail: a store that can't be read reports every key as
/// absent. Only writes surface errors, and only the writes that create
/// or update a session (a logout must always succeed locally).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backing file could not be written or replaced.
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A value (cached user, store contents) could not be serialized.
    #[error("session storage serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store refused the write (e.g. quota or read-only backend).
    #[error("session storage unavailable: {0}")]
    Unavailable(String),
}
