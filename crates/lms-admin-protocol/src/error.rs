//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. When you see a
//! `ProtocolError`, the problem is in turning values into JSON or JSON
//! back into values, not in networking or session handling.

/// Errors that can occur while encoding requests or decoding responses.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a request body failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body was not valid JSON, or did not match the
    /// expected envelope shape (missing `success`, wrong field types).
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
