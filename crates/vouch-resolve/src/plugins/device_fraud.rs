//! Device-fraud signal plugin.
//!
//! When profiling is disabled, or the applicant's session never ran the
//! profiling widget, the check yields a synthetic passing result under the
//! vendor name `"fraud_disabled"` so downstream consumers see a uniform
//! shape either way.

use std::sync::Arc;

use async_trait::async_trait;
use vouch_common::{
    ApplicantInput, CheckName, ResolutionMap, ReviewStatus, SkipReason, VendorResult,
};
use vouch_vendors::device::{FraudPayload, FraudProofer};

use crate::error::ResolverError;
use crate::events::{CheckOutcomeEvent, EventSink};
use crate::resolver::{Next, ResolutionPlugin};

pub struct DeviceFraudPlugin {
    proofer: Arc<dyn FraudProofer>,
    events: Arc<dyn EventSink>,
    enabled: bool,
}

impl DeviceFraudPlugin {
    pub fn new(proofer: Arc<dyn FraudProofer>, events: Arc<dyn EventSink>, enabled: bool) -> Self {
        Self {
            proofer,
            events,
            enabled,
        }
    }

    fn disabled_result() -> VendorResult {
        VendorResult::builder()
            .success(true)
            .vendor_name("fraud_disabled")
            .review_status(ReviewStatus::Pass)
            .reason(SkipReason::FeatureDisabled)
            .build()
    }

    fn emit(&self, result: &VendorResult) {
        self.events.check_completed(CheckOutcomeEvent {
            check: CheckName::DeviceFraud,
            vendor_name: result.vendor_name.clone(),
            success: result.success,
            reason: result.reason,
            timed_out: result.timed_out,
        });
    }
}

#[async_trait]
impl ResolutionPlugin for DeviceFraudPlugin {
    fn name(&self) -> &'static str {
        "device_fraud"
    }

    async fn call(
        &self,
        input: &ApplicantInput,
        result: ResolutionMap,
        next: Next<'_>,
    ) -> Result<ResolutionMap, ResolverError> {
        let outcome = match (self.enabled, input.profiling_session_id()) {
            (false, _) | (true, None) => Self::disabled_result(),
            (true, Some(session)) => {
                let payload = FraudPayload {
                    profiling_session_id: session.to_string(),
                    ip_address: input.other.as_ref().and_then(|o| o.ip_address.clone()),
                    email: input.other.as_ref().and_then(|o| o.email.clone()),
                };
                match self.proofer.proof(&payload).await {
                    Ok(outcome) => outcome,
                    Err(error) => VendorResult::from_error(self.proofer.vendor_name(), &error),
                }
            }
        };
        self.emit(&outcome);
        next.merge(result, [(CheckName::DeviceFraud, outcome.into())])
            .await
    }
}
