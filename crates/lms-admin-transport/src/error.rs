/// Errors that can occur in the transport layer.
///
/// A `TransportError` means no usable HTTP response came back. A response
/// with an error status (401, 500, ...) is NOT a transport error; it is
/// returned as a normal [`HttpResponse`](crate::HttpResponse) so the layers
/// above can decide what it means.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server could not be reached (DNS, refused, TLS handshake).
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// Sending the request failed after the connection was established.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading the response body failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The request could not be built (bad URL, bad header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
