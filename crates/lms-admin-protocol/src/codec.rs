//! Codec trait and implementations for request and response bodies.
//!
//! The session client doesn't care HOW bodies are serialized, it just
//! needs something that implements [`Codec`]. The admin API speaks JSON,
//! so [`JsonCodec`] is the only implementation today; tests can swap in
//! their own.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values into request bodies and decodes response bodies.
///
/// ## Trait bounds
///
/// - `Send + Sync + 'static` → one codec is shared by every clone of the
///   client and by the background refresh task.
///
/// `decode` uses `DeserializeOwned` so the decoded value owns its data
/// and the response buffer can be dropped right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// The value for the `Content-Type` header of encoded bodies.
    fn content_type(&self) -> &'static str;

    /// Serializes a value into a request body.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a response body.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use lms_admin_protocol::{ApiResponse, Codec, JsonCodec};
///
/// let codec = JsonCodec;
///
/// let body = br#"{"success":true,"message":"ok","data":7}"#;
/// let envelope: ApiResponse<u32> = codec.decode(body).unwrap();
/// assert_eq!(envelope.data, Some(7));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
