//! End-to-end pipeline scenarios against mock vendors.

use std::sync::Arc;

use vouch::resolve::events::RecordingSink;
use vouch::resolve::ProgressiveProofer;
use vouch::vendors::mock::{MockFraudProofer, MockResolutionProofer, MockStateIdProofer};
use vouch::{
    Address, AdjudicationReason, ApplicantInput, Attribute, CheckId, CheckName, StateId,
    VendorResult,
};

fn address(line1: &str) -> Address {
    Address {
        line1: line1.into(),
        line2: None,
        city: "Bayside".into(),
        state: "NY".into(),
        zipcode: "11361".into(),
    }
}

fn applicant(jurisdiction: &str, residence: &str, id_address: &str) -> ApplicantInput {
    ApplicantInput::builder()
        .state_id(
            StateId::builder()
                .id_type("drivers_license")
                .number("D123456789")
                .jurisdiction(jurisdiction)
                .first_name("Ada")
                .last_name("Lovelace")
                .dob("1990-12-10")
                .address(address(id_address))
                .build(),
        )
        .address_of_residence(address(residence))
        .build()
}

struct Harness {
    resolution: Arc<MockResolutionProofer>,
    state_id: Arc<MockStateIdProofer>,
    fraud: Arc<MockFraudProofer>,
    events: Arc<RecordingSink>,
}

impl Harness {
    fn passing() -> Self {
        Self {
            resolution: Arc::new(MockResolutionProofer::passing()),
            state_id: Arc::new(MockStateIdProofer::passing()),
            fraud: Arc::new(MockFraudProofer::passing()),
            events: Arc::new(RecordingSink::new()),
        }
    }

    fn with_resolution(result: VendorResult) -> Self {
        Self {
            resolution: Arc::new(MockResolutionProofer::returning(result)),
            ..Self::passing()
        }
    }

    fn proofer(&self) -> ProgressiveProofer {
        ProgressiveProofer::builder()
            .resolution(self.resolution.clone())
            .state_id(self.state_id.clone())
            .fraud(self.fraud.clone())
            .events(self.events.clone())
            .supported_jurisdictions(["NY".to_string(), "VA".to_string()].into())
            .device_profiling_enabled(false)
            .build()
    }
}

#[tokio::test]
async fn matching_addresses_pass_with_a_single_resolution_call() {
    let harness = Harness::passing();
    let outcome = harness
        .proofer()
        .proof_and_adjudicate(&applicant("NY", "1 Main St", "1 Main St"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.reason, AdjudicationReason::PassResolutionAndStateId);
    assert_eq!(harness.resolution.call_count(), 1);
    assert_eq!(harness.state_id.call_count(), 1);
    assert_eq!(harness.fraud.call_count(), 0);
}

#[tokio::test]
async fn distinct_addresses_verify_each_slot_independently() {
    let harness = Harness::passing();
    let map = harness
        .proofer()
        .proof(&applicant("NY", "99 Elm Ave", "1 Main St"))
        .await
        .unwrap();

    assert_eq!(harness.resolution.call_count(), 2);
    assert!(map.vendor(CheckName::AddressOfResidence).unwrap().success);
    assert!(map.vendor(CheckName::StateIdAddress).unwrap().success);
    assert!(map.decision().unwrap().passed());
}

#[tokio::test]
async fn unsupported_jurisdiction_ends_the_chain_early() {
    let harness = Harness::passing();
    let outcome = harness
        .proofer()
        .proof_and_adjudicate(&applicant("GU", "1 Main St", "1 Main St"))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.reason, AdjudicationReason::FailStateId);
    assert_eq!(harness.state_id.call_count(), 0);
    assert_eq!(harness.fraud.call_count(), 0);

    let decisions = harness.events.decisions.lock().unwrap();
    assert_eq!(decisions.len(), 1);
    assert!(decisions[0].short_circuited);
}

#[tokio::test]
async fn state_id_rescues_a_coverable_resolution_failure() {
    let coverable = VendorResult::builder()
        .vendor_name("resolution:mock")
        .can_pass_with_additional_verification(true)
        .attributes_requiring_additional_verification(vec![Attribute::Address])
        .build();
    let harness = Harness::with_resolution(coverable);
    let input = applicant("NY", "1 Main St", "1 Main St");

    let outcome = harness.proofer().proof_and_adjudicate(&input).await.unwrap();

    assert!(outcome.success);
    assert_eq!(
        outcome.reason,
        AdjudicationReason::StateIdCoversFailedResolution
    );
    // The chained decider is stricter than the adjudicator here: the
    // address slots themselves failed.
    let map = harness.proofer().proof(&input).await.unwrap();
    assert!(!map.decision().unwrap().passed());
    assert!(
        map.decision()
            .unwrap()
            .failed_checks
            .contains(&CheckId::AddressesVerified)
    );
}

#[tokio::test]
async fn unrescuable_resolution_failure_skips_the_registry() {
    let harness = Harness::with_resolution(
        VendorResult::builder().vendor_name("resolution:mock").build(),
    );
    let outcome = harness
        .proofer()
        .proof_and_adjudicate(&applicant("NY", "1 Main St", "1 Main St"))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(harness.state_id.call_count(), 0);
}

#[tokio::test]
async fn empty_input_skips_every_vendor_and_repeat_runs_are_identical() {
    let harness = Harness::passing();
    let first = harness
        .proofer()
        .proof(&ApplicantInput::default())
        .await
        .unwrap();
    let second = harness
        .proofer()
        .proof(&ApplicantInput::default())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(harness.resolution.call_count(), 0);
    assert_eq!(harness.state_id.call_count(), 0);
    assert_eq!(harness.fraud.call_count(), 0);
}

#[tokio::test]
async fn attested_different_address_hardens_a_residential_failure() {
    let failing = VendorResult::builder().vendor_name("resolution:mock").build();

    let outcome = |same_address| {
        let harness = Harness::with_resolution(failing.clone());
        let mut input = applicant("NY", "99 Elm Ave", "1 Main St");
        input.same_address_as_id = same_address;
        async move {
            ProgressiveProofer::builder()
                .resolution(harness.resolution.clone())
                .state_id(harness.state_id.clone())
                .fraud(harness.fraud.clone())
                .events(harness.events.clone())
                .supported_jurisdictions(["NY".to_string()].into())
                .device_profiling_enabled(false)
                .double_address_verification(true)
                .build()
                .proof_and_adjudicate(&input)
                .await
                .unwrap()
        }
    };

    let attested_no = outcome(vouch::SameAddressAsId::No).await;
    assert!(!attested_no.success);
    assert_eq!(
        attested_no.reason,
        AdjudicationReason::FailResolutionSkipStateId
    );

    // An unknown attestation never satisfies the hardened branch.
    let unknown = outcome(vouch::SameAddressAsId::Unknown).await;
    assert!(!unknown.success);
    assert_ne!(unknown.reason, AdjudicationReason::FailResolutionSkipStateId);
}

#[tokio::test]
async fn every_check_emits_exactly_one_outcome_event() {
    let harness = Harness::passing();
    harness
        .proofer()
        .proof(&applicant("NY", "1 Main St", "1 Main St"))
        .await
        .unwrap();

    let checks = harness.events.checks.lock().unwrap();
    let names: Vec<_> = checks.iter().map(|event| event.check).collect();
    assert_eq!(
        names,
        vec![
            CheckName::AddressOfResidence,
            CheckName::StateIdAddress,
            CheckName::StateId,
            CheckName::DeviceFraud,
        ]
    );
}
