//! Native HTTP transport implementation using `reqwest`.

use std::time::Duration;

use crate::{HttpRequest, HttpResponse, Method, Transport, TransportError};

/// A `reqwest`-backed [`Transport`].
///
/// The underlying client keeps a cookie store, so any session cookie the
/// backend sets is sent back on later requests alongside the bearer token.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an already-configured `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            id,
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(to_reqwest_method(method), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        tracing::trace!(%id, %method, %url, "dispatching request");

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            TransportError::ReceiveFailed(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                e,
            ))
        })?;

        tracing::debug!(%id, %method, status, "response received");

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Maps a `reqwest` send error onto the transport taxonomy.
fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            e,
        ))
    } else {
        TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            e,
        ))
    }
}
