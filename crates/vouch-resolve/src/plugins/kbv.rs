//! Knowledge-based verification plugin: owns the two address slots.
//!
//! When the state-ID address and the residence address are identical the
//! plugin issues a single vendor call and files the same result under
//! both slots. This de-duplication is a deliberate cost/latency
//! optimization, not an accident of implementation.

use std::sync::Arc;

use async_trait::async_trait;
use vouch_common::{
    Address, ApplicantInput, CheckEntry, CheckName, ResolutionMap, SkipReason, VendorResult,
};
use vouch_vendors::kbv::{ResolutionPayload, ResolutionProofer};

use crate::error::ResolverError;
use crate::events::{CheckOutcomeEvent, EventSink};
use crate::resolver::{Next, ResolutionPlugin};

pub struct KnowledgeBasedPlugin {
    proofer: Arc<dyn ResolutionProofer>,
    events: Arc<dyn EventSink>,
}

impl KnowledgeBasedPlugin {
    pub fn new(proofer: Arc<dyn ResolutionProofer>, events: Arc<dyn EventSink>) -> Self {
        Self { proofer, events }
    }

    fn payload(&self, input: &ApplicantInput, address: &Address) -> ResolutionPayload {
        let (first_name, last_name, dob) = match input.state_id.as_ref() {
            Some(id) => (id.first_name.clone(), id.last_name.clone(), id.dob.clone()),
            None => (String::new(), String::new(), None),
        };
        ResolutionPayload {
            first_name,
            last_name,
            dob,
            ssn: input.other.as_ref().and_then(|o| o.ssn.clone()),
            address: address.clone(),
        }
    }

    async fn verify(&self, input: &ApplicantInput, address: &Address) -> VendorResult {
        match self.proofer.proof(&self.payload(input, address)).await {
            Ok(result) => result,
            // Exhausted retries and other vendor-layer errors stop here;
            // the chain keeps running with a failed sub-result.
            Err(error) => VendorResult::from_error(self.proofer.vendor_name(), &error),
        }
    }

    fn emit(&self, check: CheckName, result: &VendorResult) {
        self.events.check_completed(CheckOutcomeEvent {
            check,
            vendor_name: result.vendor_name.clone(),
            success: result.success,
            reason: result.reason,
            timed_out: result.timed_out,
        });
    }
}

#[async_trait]
impl ResolutionPlugin for KnowledgeBasedPlugin {
    fn name(&self) -> &'static str {
        "knowledge_based"
    }

    async fn call(
        &self,
        input: &ApplicantInput,
        result: ResolutionMap,
        next: Next<'_>,
    ) -> Result<ResolutionMap, ResolverError> {
        let residence = input.address_of_residence.as_ref();
        let id_address = input.state_id_address();

        let (residence_entry, id_entry) = match (residence, id_address) {
            (None, None) => (
                VendorResult::skipped(self.proofer.vendor_name(), SkipReason::NoAddressOfResidence),
                VendorResult::skipped(self.proofer.vendor_name(), SkipReason::NoStateId),
            ),
            (Some(residence), None) => (
                self.verify(input, residence).await,
                VendorResult::skipped(self.proofer.vendor_name(), SkipReason::NoStateId),
            ),
            (None, Some(id_address)) => (
                VendorResult::skipped(self.proofer.vendor_name(), SkipReason::NoAddressOfResidence),
                self.verify(input, id_address).await,
            ),
            (Some(residence), Some(id_address)) if residence == id_address => {
                // Identical addresses: one vendor call, both slots.
                let shared = self.verify(input, residence).await;
                (shared.clone(), shared)
            }
            (Some(residence), Some(id_address)) => (
                self.verify(input, residence).await,
                self.verify(input, id_address).await,
            ),
        };

        self.emit(CheckName::AddressOfResidence, &residence_entry);
        self.emit(CheckName::StateIdAddress, &id_entry);
        next.merge(
            result,
            [
                (CheckName::AddressOfResidence, CheckEntry::Vendor(residence_entry)),
                (CheckName::StateIdAddress, CheckEntry::Vendor(id_entry)),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_common::{Address, StateId};
    use vouch_vendors::mock::MockResolutionProofer;

    fn address(line1: &str) -> Address {
        Address {
            line1: line1.into(),
            line2: None,
            city: "Bayside".into(),
            state: "NY".into(),
            zipcode: "11361".into(),
        }
    }

    fn input_with(residence: &str, id_addr: &str) -> ApplicantInput {
        ApplicantInput::builder()
            .state_id(
                StateId::builder()
                    .id_type("drivers_license")
                    .number("D123456789")
                    .jurisdiction("NY")
                    .first_name("Ada")
                    .last_name("Lovelace")
                    .address(address(id_addr))
                    .build(),
            )
            .address_of_residence(address(residence))
            .build()
    }

    async fn run(
        plugin: KnowledgeBasedPlugin,
        input: &ApplicantInput,
    ) -> ResolutionMap {
        let resolver = crate::resolver::IdentityResolver::new(
            vec![Arc::new(plugin)],
            Arc::new(crate::events::NullSink),
        );
        resolver.resolve_identity(input).await.unwrap()
    }

    #[tokio::test]
    async fn identical_addresses_issue_one_call_filling_both_slots() {
        let proofer = Arc::new(MockResolutionProofer::passing());
        let plugin =
            KnowledgeBasedPlugin::new(proofer.clone(), Arc::new(crate::events::NullSink));

        let map = run(plugin, &input_with("1 Main St", "1 Main St")).await;

        assert_eq!(proofer.call_count(), 1);
        assert_eq!(
            map.vendor(CheckName::AddressOfResidence),
            map.vendor(CheckName::StateIdAddress)
        );
    }

    #[tokio::test]
    async fn distinct_addresses_issue_two_calls() {
        let proofer = Arc::new(MockResolutionProofer::passing());
        let plugin =
            KnowledgeBasedPlugin::new(proofer.clone(), Arc::new(crate::events::NullSink));

        run(plugin, &input_with("1 Main St", "99 Elm Ave")).await;

        assert_eq!(proofer.call_count(), 2);
        let payloads = proofer.payloads.clone();
        let payloads = payloads.lock().await;
        assert_eq!(payloads[0].address.line1, "1 Main St");
        assert_eq!(payloads[1].address.line1, "99 Elm Ave");
    }

    #[tokio::test]
    async fn missing_everything_skips_both_slots_without_vendor_calls() {
        let proofer = Arc::new(MockResolutionProofer::passing());
        let plugin =
            KnowledgeBasedPlugin::new(proofer.clone(), Arc::new(crate::events::NullSink));

        let map = run(plugin, &ApplicantInput::default()).await;

        assert_eq!(proofer.call_count(), 0);
        assert_eq!(
            map.vendor(CheckName::AddressOfResidence).unwrap().reason,
            Some(SkipReason::NoAddressOfResidence)
        );
        assert_eq!(
            map.vendor(CheckName::StateIdAddress).unwrap().reason,
            Some(SkipReason::NoStateId)
        );
    }

    #[tokio::test]
    async fn skip_results_are_idempotent() {
        let proofer = Arc::new(MockResolutionProofer::passing());
        let input = ApplicantInput::default();

        let first = run(
            KnowledgeBasedPlugin::new(proofer.clone(), Arc::new(crate::events::NullSink)),
            &input,
        )
        .await;
        let second = run(
            KnowledgeBasedPlugin::new(proofer.clone(), Arc::new(crate::events::NullSink)),
            &input,
        )
        .await;

        assert_eq!(first, second);
        assert_eq!(proofer.call_count(), 0);
    }
}
