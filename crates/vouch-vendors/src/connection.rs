//! Request plumbing shared by every vendor client: build the request, send
//! it with a bounded timeout through the retry policy, classify the
//! outcome, and decode the body.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use vouch_common::{HttpError, HttpTransport, TransportError, VendorConfig, VendorError};

use crate::retry::RetryPolicy;

/// A resilient connection to one vendor endpoint.
#[derive(Clone)]
pub struct VendorConnection<T> {
    transport: Arc<T>,
    vendor: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl<T: HttpTransport> VendorConnection<T> {
    /// Build a connection from a vendor's config block.
    pub fn new(transport: Arc<T>, vendor: impl Into<String>, config: &VendorConfig) -> Self {
        Self::with_settings(
            transport,
            vendor,
            config.timeout(),
            RetryPolicy::new(config.retry.clone()),
        )
    }

    pub fn with_settings(
        transport: Arc<T>,
        vendor: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            vendor: vendor.into(),
            timeout,
            retry,
        }
    }

    /// POST a JSON body and decode a JSON response, retrying per policy.
    pub async fn post_json<B, R>(
        &self,
        url: &Url,
        headers: &[(&str, String)],
        body: &B,
    ) -> Result<R, VendorError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)?;
        self.retry
            .run(&self.vendor, || {
                self.send_once(url, "application/json", headers, payload.clone())
            })
            .await
    }

    /// POST a form-encoded body and decode a JSON response, retrying per
    /// policy. Used by auth endpoints that predate JSON request bodies.
    pub async fn post_form<R>(
        &self,
        url: &Url,
        form: &[(&str, &str)],
    ) -> Result<R, VendorError>
    where
        R: DeserializeOwned,
    {
        // The form serializer is not Send; encode before any await.
        let payload = {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (name, value) in form {
                serializer.append_pair(name, value);
            }
            serializer.finish().into_bytes()
        };
        self.retry
            .run(&self.vendor, || {
                self.send_once(
                    url,
                    "application/x-www-form-urlencoded",
                    &[],
                    payload.clone(),
                )
            })
            .await
    }

    async fn send_once<R: DeserializeOwned>(
        &self,
        url: &Url,
        content_type: &str,
        headers: &[(&str, String)],
        payload: Vec<u8>,
    ) -> Result<R, VendorError> {
        let mut builder = http::Request::builder()
            .method(http::Method::POST)
            .uri(url.as_str())
            .header(http::header::CONTENT_TYPE, content_type);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        let request = builder
            .body(payload)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.transport.send(request))
            .await
            .map_err(|_| TransportError::Timeout)??;

        let status = response.status();
        if !status.is_success() {
            let body = String::from_utf8(response.into_body()).ok();
            return Err(VendorError::Http(HttpError { status, body }));
        }
        Ok(serde_json::from_slice(response.body())?)
    }
}
