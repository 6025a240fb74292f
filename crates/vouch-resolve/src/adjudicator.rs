//! Stateless reducer from the four vendor results to a single adjudicated
//! outcome with a stable reason code.
//!
//! The decision table is evaluated strictly in precedence order; the first
//! matching branch wins. Everything needed for an audit trail travels in
//! the output: the merged error map, the first recorded exception, and a
//! JSON context embedding every stage's serialized result.

use std::collections::BTreeMap;

use bon::Builder;
use serde::{Deserialize, Serialize};
use vouch_common::{SameAddressAsId, VendorResult};

/// Why adjudication landed where it did. Stable codes; downstream routing
/// switches on these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjudicationReason {
    /// Residential address failed and the applicant attested to living
    /// elsewhere than the ID address, in a flow that requires the
    /// residential check; the state-ID result cannot rescue this.
    FailResolutionSkipStateId,
    PassResolutionAndStateId,
    FailStateId,
    /// Resolution failed, the state ID independently verified every
    /// attribute the resolution check flagged.
    StateIdCoversFailedResolution,
    FailResolutionWithoutStateIdCoverage,
}

/// Final outcome of one resolution attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdjudicatedResult {
    pub success: bool,
    pub reason: AdjudicationReason,
    /// Per-attribute errors, union over all four checks.
    pub errors: BTreeMap<String, Vec<String>>,
    /// First exception recorded by any check.
    pub exception: Option<String>,
    /// Any check timed out.
    pub timed_out: bool,
    /// Audit payload: every stage's serialized result plus the reason.
    pub context: serde_json::Value,
}

/// Pure reducer over the four vendor results and the flow flags.
///
/// `resolution_result` is the knowledge-based check against the state-ID
/// address; `residential_resolution_result` the same check against the
/// claimed residence. When the two addresses matched upstream these are
/// clones of one vendor call.
#[derive(Clone, Debug, Builder)]
pub struct ResultAdjudicator {
    resolution_result: VendorResult,
    residential_resolution_result: VendorResult,
    state_id_result: VendorResult,
    device_fraud_result: VendorResult,
    /// The flow requires a state-ID check (document-based proofing).
    should_proof_state_id: bool,
    /// In-person-proofing enrollment is underway, which hardens the
    /// residential-address requirement.
    #[builder(default)]
    ipp_enrollment_in_progress: bool,
    /// Both addresses must verify independently.
    #[builder(default)]
    double_address_verification: bool,
    #[builder(default)]
    same_address_as_id: SameAddressAsId,
}

impl ResultAdjudicator {
    pub fn adjudicate(&self) -> AdjudicatedResult {
        let (branch_passed, reason) = self.decide();
        let success = branch_passed && self.device_fraud_result.exception.is_none();
        let timed_out = self.stages().iter().any(|(_, stage)| stage.timed_out);
        AdjudicatedResult {
            success,
            reason,
            errors: self.merged_errors(),
            exception: self.first_exception(),
            timed_out,
            context: self.context(reason),
        }
    }

    fn decide(&self) -> (bool, AdjudicationReason) {
        let residential_required =
            self.ipp_enrollment_in_progress || self.double_address_verification;
        if !self.residential_resolution_result.success
            && self.same_address_as_id.is_no()
            && residential_required
        {
            return (false, AdjudicationReason::FailResolutionSkipStateId);
        }
        if self.resolution_result.success && self.state_id_result.success {
            return (true, AdjudicationReason::PassResolutionAndStateId);
        }
        if !self.state_id_result.success {
            return (false, AdjudicationReason::FailStateId);
        }
        if !self.should_proof_state_id {
            return (false, AdjudicationReason::FailResolutionSkipStateId);
        }
        if self.state_id_covers_resolution() {
            return (true, AdjudicationReason::StateIdCoversFailedResolution);
        }
        (false, AdjudicationReason::FailResolutionWithoutStateIdCoverage)
    }

    /// "Get to yes": every attribute the resolution check flagged was
    /// independently verified by the state ID.
    fn state_id_covers_resolution(&self) -> bool {
        let wanted = &self
            .resolution_result
            .attributes_requiring_additional_verification;
        self.resolution_result.can_pass_with_additional_verification
            && !wanted.is_empty()
            && wanted
                .iter()
                .all(|attr| self.state_id_result.verified_attributes.contains(attr))
    }

    fn stages(&self) -> [(&'static str, &VendorResult); 4] {
        [
            ("resolution", &self.resolution_result),
            ("residential_address", &self.residential_resolution_result),
            ("state_id", &self.state_id_result),
            ("device_fraud", &self.device_fraud_result),
        ]
    }

    fn merged_errors(&self) -> BTreeMap<String, Vec<String>> {
        let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (_, stage) in self.stages() {
            for (attribute, messages) in &stage.errors {
                merged
                    .entry(attribute.clone())
                    .or_default()
                    .extend(messages.iter().cloned());
            }
        }
        merged
    }

    fn first_exception(&self) -> Option<String> {
        self.stages()
            .iter()
            .find_map(|(_, stage)| stage.exception.clone())
    }

    fn context(&self, reason: AdjudicationReason) -> serde_json::Value {
        let stages: serde_json::Map<String, serde_json::Value> = self
            .stages()
            .iter()
            .map(|(name, stage)| {
                (
                    name.to_string(),
                    serde_json::to_value(stage).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();
        serde_json::json!({
            "reason": reason,
            "stages": stages,
        })
    }
}
