//! State-ID verification plugin.
//!
//! Runs after the knowledge-based plugin so it can gate on its outcome:
//! when the knowledge-based check already failed with no chance of rescue
//! (`can_pass_with_additional_verification == false`), calling the state
//! registry cannot change the decision, so the vendor call is skipped.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use vouch_common::{
    ApplicantInput, CheckName, ResolutionMap, SkipReason, StateId, VendorResult,
};
use vouch_vendors::registry::{StateIdPayload, StateIdProofer};

use crate::error::ResolverError;
use crate::events::{CheckOutcomeEvent, EventSink};
use crate::resolver::{Next, ResolutionPlugin};

pub struct StateIdPlugin {
    proofer: Arc<dyn StateIdProofer>,
    events: Arc<dyn EventSink>,
    supported_jurisdictions: BTreeSet<String>,
}

impl StateIdPlugin {
    pub fn new(
        proofer: Arc<dyn StateIdProofer>,
        events: Arc<dyn EventSink>,
        supported_jurisdictions: BTreeSet<String>,
    ) -> Self {
        Self {
            proofer,
            events,
            supported_jurisdictions,
        }
    }

    fn payload(&self, id: &StateId) -> StateIdPayload {
        StateIdPayload {
            id_type: id.id_type.clone(),
            number: id.number.clone(),
            jurisdiction: id.jurisdiction.clone(),
            first_name: id.first_name.clone(),
            last_name: id.last_name.clone(),
            middle_name: id.middle_name.clone(),
            dob: id.dob.clone(),
            address: id.address.clone(),
        }
    }

    /// A registry call cannot flip the outcome when the knowledge-based
    /// check already failed with nothing a secondary check could cover.
    fn cannot_get_to_yes(&self, result: &ResolutionMap) -> bool {
        match result.vendor(CheckName::StateIdAddress) {
            Some(kbv) => {
                !kbv.success && kbv.reason.is_none() && !kbv.can_pass_with_additional_verification
            }
            None => false,
        }
    }

    fn emit(&self, result: &VendorResult) {
        self.events.check_completed(CheckOutcomeEvent {
            check: CheckName::StateId,
            vendor_name: result.vendor_name.clone(),
            success: result.success,
            reason: result.reason,
            timed_out: result.timed_out,
        });
    }
}

#[async_trait]
impl ResolutionPlugin for StateIdPlugin {
    fn name(&self) -> &'static str {
        "state_id"
    }

    async fn call(
        &self,
        input: &ApplicantInput,
        result: ResolutionMap,
        next: Next<'_>,
    ) -> Result<ResolutionMap, ResolverError> {
        let Some(id) = input.state_id.as_ref() else {
            let skip =
                VendorResult::skipped(self.proofer.vendor_name(), SkipReason::NoStateId);
            self.emit(&skip);
            return next
                .merge(result, [(CheckName::StateId, skip.into())])
                .await;
        };

        if !self.supported_jurisdictions.contains(&id.jurisdiction) {
            tracing::info!(jurisdiction = %id.jurisdiction, "unsupported jurisdiction; ending resolution");
            let skip = VendorResult::skipped(
                self.proofer.vendor_name(),
                SkipReason::UnsupportedJurisdiction,
            );
            self.emit(&skip);
            // Short-circuit: downstream plugins never run.
            return Ok(result.with_vendor(CheckName::StateId, skip));
        }

        if self.cannot_get_to_yes(&result) {
            let skip = VendorResult::skipped(
                self.proofer.vendor_name(),
                SkipReason::UnsupportedJurisdiction,
            );
            self.emit(&skip);
            return next
                .merge(result, [(CheckName::StateId, skip.into())])
                .await;
        }

        let outcome = match self.proofer.proof(&self.payload(id)).await {
            Ok(outcome) => outcome,
            Err(error) => VendorResult::from_error(self.proofer.vendor_name(), &error),
        };
        self.emit(&outcome);
        next.merge(result, [(CheckName::StateId, outcome.into())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_common::{Address, CheckEntry};
    use vouch_vendors::mock::MockStateIdProofer;

    fn supported() -> BTreeSet<String> {
        ["NY", "VA"].iter().map(|s| s.to_string()).collect()
    }

    fn input(jurisdiction: &str) -> ApplicantInput {
        ApplicantInput::builder()
            .state_id(
                StateId::builder()
                    .id_type("drivers_license")
                    .number("D123456789")
                    .jurisdiction(jurisdiction)
                    .first_name("Ada")
                    .last_name("Lovelace")
                    .address(Address {
                        line1: "1 Main St".into(),
                        line2: None,
                        city: "Bayside".into(),
                        state: "NY".into(),
                        zipcode: "11361".into(),
                    })
                    .build(),
            )
            .build()
    }

    fn plugin(proofer: &Arc<MockStateIdProofer>) -> StateIdPlugin {
        StateIdPlugin::new(proofer.clone(), Arc::new(crate::events::NullSink), supported())
    }

    fn next<'a>(input: &'a ApplicantInput) -> Next<'a> {
        Next::terminal(input)
    }

    #[tokio::test]
    async fn missing_state_id_skips_without_vendor_call() {
        let proofer = Arc::new(MockStateIdProofer::passing());
        let input = ApplicantInput::default();

        let map = plugin(&proofer)
            .call(&input, ResolutionMap::new(), next(&input))
            .await
            .unwrap();

        assert_eq!(proofer.call_count(), 0);
        assert_eq!(
            map.vendor(CheckName::StateId).unwrap().reason,
            Some(SkipReason::NoStateId)
        );
    }

    #[tokio::test]
    async fn unsupported_jurisdiction_skips_and_short_circuits() {
        let proofer = Arc::new(MockStateIdProofer::passing());
        let input = input("PR");

        let map = plugin(&proofer)
            .call(&input, ResolutionMap::new(), next(&input))
            .await
            .unwrap();

        assert_eq!(proofer.call_count(), 0);
        assert_eq!(
            map.vendor(CheckName::StateId).unwrap().reason,
            Some(SkipReason::UnsupportedJurisdiction)
        );
    }

    #[tokio::test]
    async fn supported_jurisdiction_calls_the_registry() {
        let proofer = Arc::new(MockStateIdProofer::passing());
        let input = input("NY");

        let map = plugin(&proofer)
            .call(&input, ResolutionMap::new(), next(&input))
            .await
            .unwrap();

        assert_eq!(proofer.call_count(), 1);
        assert!(map.vendor(CheckName::StateId).unwrap().success);
        let payloads = proofer.payloads.lock().await;
        assert_eq!(payloads[0].jurisdiction, "NY");
    }

    #[tokio::test]
    async fn unrescuable_resolution_failure_gates_the_vendor_call() {
        let proofer = Arc::new(MockStateIdProofer::passing());
        let input = input("NY");
        let prior = ResolutionMap::new().with(
            CheckName::StateIdAddress,
            CheckEntry::Vendor(
                VendorResult::builder()
                    .vendor_name("resolution:kbv")
                    .build(),
            ),
        );

        let map = plugin(&proofer)
            .call(&input, prior, next(&input))
            .await
            .unwrap();

        assert_eq!(proofer.call_count(), 0);
        assert_eq!(
            map.vendor(CheckName::StateId).unwrap().reason,
            Some(SkipReason::UnsupportedJurisdiction)
        );
    }

    #[tokio::test]
    async fn rescuable_resolution_failure_still_calls_the_vendor() {
        let proofer = Arc::new(MockStateIdProofer::passing());
        let input = input("NY");
        let prior = ResolutionMap::new().with(
            CheckName::StateIdAddress,
            CheckEntry::Vendor(
                VendorResult::builder()
                    .vendor_name("resolution:kbv")
                    .can_pass_with_additional_verification(true)
                    .attributes_requiring_additional_verification(vec![
                        vouch_common::Attribute::Address,
                    ])
                    .build(),
            ),
        );

        plugin(&proofer)
            .call(&input, prior, next(&input))
            .await
            .unwrap();

        assert_eq!(proofer.call_count(), 1);
    }
}
