//! Minimal HTTP transport abstraction shared across vendor clients.
//!
//! Vendor clients are written against [`HttpTransport`] rather than a
//! concrete HTTP library so that tests and offline environments can swap in
//! a canned-response transport. This substitutability is load-bearing: the
//! mock/real vendor switch in `vouch-vendors` relies on it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;

/// HTTP transport trait for sending raw HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request and return the response.
    ///
    /// Implementations normalize their library-specific failures into
    /// [`TransportError`] so the retry layer can classify them uniformly.
    async fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError>;
}

#[cfg(feature = "reqwest-client")]
#[async_trait]
impl HttpTransport for reqwest::Client {
    async fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError> {
        let (parts, body) = request.into_parts();

        let mut req = self.request(parts.method, parts.uri.to_string()).body(body);
        for (name, value) in parts.headers.iter() {
            req = req.header(name.as_str(), value.as_bytes());
        }

        let resp = req.send().await?;

        let mut builder = http::Response::builder().status(resp.status());
        for (name, value) in resp.headers().iter() {
            builder = builder.header(name.as_str(), value.as_bytes());
        }
        let body = resp.bytes().await?.to_vec();

        builder
            .body(body)
            .map_err(|e| TransportError::Other(Box::new(e)))
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for Arc<T> {
    async fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError> {
        self.as_ref().send(request).await
    }
}
