//! Device-fraud signal client: queries the device-profiling vendor for the
//! risk review status of a profiling session.
//!
//! A `review` status is a soft signal (reviewed out-of-band) and does not
//! by itself fail adjudication; an exception during the check does.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;
use vouch_common::{
    AuthError, HttpTransport, ReviewStatus, VendorConfig, VendorError, VendorResult,
};

use crate::connection::VendorConnection;

/// Session identifiers submitted for a fraud-signal lookup. Deliberately
/// thin: the vendor already holds the device fingerprint keyed by the
/// profiling session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FraudPayload {
    pub profiling_session_id: String,
    pub ip_address: Option<String>,
    pub email: Option<String>,
}

/// One vendor's device-fraud check, mockable behind a config flag.
#[async_trait]
pub trait FraudProofer: Send + Sync {
    fn vendor_name(&self) -> &str;
    async fn proof(&self, payload: &FraudPayload) -> Result<VendorResult, VendorError>;
}

const VENDOR_NAME: &str = "device_fraud:ddp";

/// Live device-profiling client.
pub struct LiveFraudClient<T> {
    connection: VendorConnection<T>,
    url: Url,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FraudResponse {
    transaction_id: Option<String>,
    review_status: Option<String>,
    error: Option<FraudError>,
}

#[derive(Debug, Deserialize)]
struct FraudError {
    code: Option<i64>,
    message: Option<String>,
}

impl<T: HttpTransport> LiveFraudClient<T> {
    pub fn new(connection: VendorConnection<T>, config: &VendorConfig) -> Self {
        Self {
            connection,
            url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl<T: HttpTransport> FraudProofer for LiveFraudClient<T> {
    fn vendor_name(&self) -> &str {
        VENDOR_NAME
    }

    async fn proof(&self, payload: &FraudPayload) -> Result<VendorResult, VendorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(VendorError::Auth(AuthError::MissingCredentials))?;
        let response: FraudResponse = self
            .connection
            .post_json(&self.url, &[("X-Api-Key", api_key.to_owned())], payload)
            .await?;

        if let Some(envelope) = response.error {
            return Err(VendorError::Envelope {
                code: envelope.code,
                message: envelope
                    .message
                    .unwrap_or_else(|| "fraud query rejected".into()),
            });
        }

        let review_status = match response.review_status.as_deref() {
            Some("pass") => ReviewStatus::Pass,
            Some("review") => ReviewStatus::Review,
            // Anything unrecognized is treated as a rejection.
            _ => ReviewStatus::Reject,
        };

        Ok(VendorResult::builder()
            .success(review_status == ReviewStatus::Pass)
            .vendor_name(VENDOR_NAME)
            .maybe_transaction_id(response.transaction_id)
            .review_status(review_status)
            .build())
    }
}
