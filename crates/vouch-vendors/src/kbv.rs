//! Knowledge-based verification client: checks identity attributes and an
//! address (and optionally SSN) against commercial record aggregators.
//!
//! A failed check may still be rescued downstream: when every failing
//! attribute is one the state-ID registry can independently verify, the
//! result is marked eligible for additional verification and lists the
//! attributes a secondary check would need to cover.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;
use vouch_common::{
    Address, Attribute, AuthError, HttpTransport, VendorConfig, VendorError, VendorResult,
};

use crate::connection::VendorConnection;

/// Applicant fields submitted for one knowledge-based check. The same
/// payload shape serves both address slots; only `address` differs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolutionPayload {
    pub first_name: String,
    pub last_name: String,
    pub dob: Option<String>,
    pub ssn: Option<String>,
    pub address: Address,
}

/// One vendor's knowledge-based check, mockable behind a config flag.
#[async_trait]
pub trait ResolutionProofer: Send + Sync {
    fn vendor_name(&self) -> &str;
    async fn proof(&self, payload: &ResolutionPayload) -> Result<VendorResult, VendorError>;
}

const VENDOR_NAME: &str = "resolution:kbv";

/// Name reported when percentage bucketing routes a session to the
/// alternate knowledge-based vendor, so audit events can tell the two
/// arms apart.
pub const ALTERNATE_VENDOR_NAME: &str = "resolution:kbv_alternate";

/// Attributes the state-ID registry can independently verify; failures
/// confined to this set are eligible for the "get to yes" path.
const COVERABLE: [Attribute; 2] = [Attribute::Address, Attribute::Dob];

/// Live knowledge-based verification client.
pub struct KnowledgeBasedClient<T> {
    connection: VendorConnection<T>,
    url: Url,
    api_key: Option<String>,
    vendor_name: String,
}

#[derive(Debug, Deserialize)]
struct KbvResponse {
    transaction_id: Option<String>,
    #[serde(default)]
    checks: Vec<KbvCheck>,
    error: Option<KbvError>,
}

#[derive(Debug, Deserialize)]
struct KbvCheck {
    attribute: String,
    passed: bool,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KbvError {
    code: Option<i64>,
    message: Option<String>,
}

impl<T: HttpTransport> KnowledgeBasedClient<T> {
    pub fn new(connection: VendorConnection<T>, config: &VendorConfig) -> Self {
        Self {
            connection,
            url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            vendor_name: VENDOR_NAME.into(),
        }
    }

    /// Override the name stamped onto results, for alternate-vendor arms.
    pub fn with_vendor_name(mut self, name: impl Into<String>) -> Self {
        self.vendor_name = name.into();
        self
    }
}

fn attribute_for(name: &str) -> Option<Attribute> {
    match name {
        "first_name" => Some(Attribute::FirstName),
        "last_name" => Some(Attribute::LastName),
        "dob" => Some(Attribute::Dob),
        "address" => Some(Attribute::Address),
        "ssn" => Some(Attribute::Ssn),
        "zipcode" => Some(Attribute::Zipcode),
        _ => None,
    }
}

#[async_trait]
impl<T: HttpTransport> ResolutionProofer for KnowledgeBasedClient<T> {
    fn vendor_name(&self) -> &str {
        &self.vendor_name
    }

    async fn proof(&self, payload: &ResolutionPayload) -> Result<VendorResult, VendorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(VendorError::Auth(AuthError::MissingCredentials))?;
        let response: KbvResponse = self
            .connection
            .post_json(&self.url, &[("X-Api-Key", api_key.to_owned())], payload)
            .await?;

        if let Some(envelope) = response.error {
            return Err(VendorError::Envelope {
                code: envelope.code,
                message: envelope
                    .message
                    .unwrap_or_else(|| "verification request rejected".into()),
            });
        }

        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut verified = std::collections::BTreeSet::new();
        let mut failed = Vec::new();
        for check in &response.checks {
            let attribute = attribute_for(&check.attribute);
            if check.passed {
                if let Some(attribute) = attribute {
                    verified.insert(attribute);
                }
            } else {
                errors.entry(check.attribute.clone()).or_default().push(
                    check
                        .message
                        .clone()
                        .unwrap_or_else(|| "attribute could not be verified".into()),
                );
                if let Some(attribute) = attribute {
                    failed.push(attribute);
                }
            }
        }

        let success = errors.is_empty() && !response.checks.is_empty();
        // Eligible for rescue only when every failure is coverable and the
        // vendor actually told us which attributes failed.
        let can_pass = !success
            && !failed.is_empty()
            && failed.len() == errors.len()
            && failed.iter().all(|a| COVERABLE.contains(a));

        Ok(VendorResult::builder()
            .success(success)
            .vendor_name(self.vendor_name.clone())
            .maybe_transaction_id(response.transaction_id)
            .errors(errors)
            .verified_attributes(verified)
            .can_pass_with_additional_verification(can_pass)
            .attributes_requiring_additional_verification(if can_pass { failed } else { Vec::new() })
            .build())
    }
}
