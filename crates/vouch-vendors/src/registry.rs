//! State-ID registry client: verifies document fields against the issuing
//! jurisdiction's records.
//!
//! The registry uses session-token auth; tokens are cached through the
//! [`TokenKeeper`]. Responses carry a per-attribute match breakdown that is
//! normalized into `verified_attributes` plus a per-attribute error map.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;
use vouch_common::{
    Address, Attribute, HttpTransport, TokenStore, VendorConfig, VendorError, VendorResult,
};

use crate::connection::VendorConnection;
use crate::token::TokenKeeper;

/// Fields submitted to the registry, shaped from the applicant's state ID.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateIdPayload {
    pub id_type: String,
    pub number: String,
    pub jurisdiction: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub dob: Option<String>,
    pub address: Address,
}

/// One vendor's state-ID check, mockable behind a single config flag.
#[async_trait]
pub trait StateIdProofer: Send + Sync {
    fn vendor_name(&self) -> &str;
    /// Verify the document against the registry. Transport failures and
    /// exhausted retries surface as `Err`; business-rule mismatches are
    /// `Ok` results with `success: false`.
    async fn proof(&self, payload: &StateIdPayload) -> Result<VendorResult, VendorError>;
}

const VENDOR_NAME: &str = "state_id:registry";

/// Live registry client.
pub struct RegistryClient<S, T> {
    connection: VendorConnection<T>,
    tokens: TokenKeeper<S, T>,
    url: Url,
}

#[derive(Debug, Deserialize)]
struct RegistryResponse {
    transaction_id: Option<String>,
    /// Attribute name to match flag
    #[serde(default)]
    results: BTreeMap<String, bool>,
    error: Option<RegistryError>,
}

#[derive(Debug, Deserialize)]
struct RegistryError {
    code: Option<i64>,
    message: Option<String>,
}

impl<S: TokenStore, T: HttpTransport> RegistryClient<S, T> {
    pub fn new(
        connection: VendorConnection<T>,
        tokens: TokenKeeper<S, T>,
        config: &VendorConfig,
    ) -> Self {
        Self {
            connection,
            tokens,
            url: config.base_url.clone(),
        }
    }
}

fn attribute_for(name: &str) -> Option<Attribute> {
    match name {
        "first_name" => Some(Attribute::FirstName),
        "last_name" => Some(Attribute::LastName),
        "dob" => Some(Attribute::Dob),
        "address" => Some(Attribute::Address),
        "zipcode" => Some(Attribute::Zipcode),
        _ => None,
    }
}

#[async_trait]
impl<S: TokenStore, T: HttpTransport> StateIdProofer for RegistryClient<S, T> {
    fn vendor_name(&self) -> &str {
        VENDOR_NAME
    }

    async fn proof(&self, payload: &StateIdPayload) -> Result<VendorResult, VendorError> {
        let token = self.tokens.token().await?;
        let response: RegistryResponse = self
            .connection
            .post_json(
                &self.url,
                &[("Authorization", format!("Bearer {token}"))],
                payload,
            )
            .await?;

        if let Some(envelope) = response.error {
            return Err(VendorError::Envelope {
                code: envelope.code,
                message: envelope
                    .message
                    .unwrap_or_else(|| "registry rejected the request".into()),
            });
        }

        let mut verified = std::collections::BTreeSet::new();
        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, matched) in &response.results {
            if *matched {
                if let Some(attribute) = attribute_for(name) {
                    verified.insert(attribute);
                }
            } else {
                errors
                    .entry(name.clone())
                    .or_default()
                    .push("does not match registry record".into());
            }
        }

        Ok(VendorResult::builder()
            .success(errors.is_empty() && !response.results.is_empty())
            .vendor_name(VENDOR_NAME)
            .maybe_transaction_id(response.transaction_id)
            .errors(errors)
            .verified_attributes(verified)
            .build())
    }
}
