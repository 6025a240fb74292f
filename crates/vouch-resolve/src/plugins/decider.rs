//! Terminal plugin that folds the accumulated map into a pass/fail
//! decision.
//!
//! The checklist is fixed and ordered; every failing check is reported, in
//! checklist order, so callers can tell the applicant everything that
//! needs fixing rather than one issue per attempt. A check that cannot be
//! evaluated against a partial map counts as failed.

use async_trait::async_trait;
use vouch_common::{
    ApplicantInput, CheckId, CheckName, Decision, Outcome, ResolutionMap, SkipReason,
};

use crate::error::ResolverError;
use crate::resolver::{Next, ResolutionPlugin};

/// Stateless; the terminal decision event is emitted by the resolver once
/// the whole chain has returned.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeciderPlugin;

impl DeciderPlugin {
    pub fn new() -> Self {
        Self
    }

    fn check(check: CheckId, input: &ApplicantInput, result: &ResolutionMap) -> bool {
        match check {
            CheckId::StateIdPresent => input.state_id.is_some(),
            CheckId::ResidentialAddressPresent => input.address_of_residence.is_some(),
            CheckId::DeviceFraudPassed => result
                .vendor(CheckName::DeviceFraud)
                .is_some_and(|fraud| fraud.passed()),
            CheckId::AddressesVerified => {
                [CheckName::AddressOfResidence, CheckName::StateIdAddress]
                    .iter()
                    .all(|&slot| result.vendor(slot).is_some_and(|check| check.passed()))
            }
            CheckId::StateIdVerified => result.vendor(CheckName::StateId).is_some_and(|id| {
                id.passed() || id.reason == Some(SkipReason::UnsupportedJurisdiction)
            }),
        }
    }

    fn decide(input: &ApplicantInput, result: &ResolutionMap) -> Decision {
        const CHECKLIST: [CheckId; 5] = [
            CheckId::StateIdPresent,
            CheckId::ResidentialAddressPresent,
            CheckId::DeviceFraudPassed,
            CheckId::AddressesVerified,
            CheckId::StateIdVerified,
        ];

        let failed_checks: Vec<CheckId> = CHECKLIST
            .into_iter()
            .filter(|&check| !Self::check(check, input, result))
            .collect();
        let outcome = if failed_checks.is_empty() {
            Outcome::Pass
        } else {
            Outcome::Fail
        };
        Decision {
            outcome,
            failed_checks,
        }
    }
}

#[async_trait]
impl ResolutionPlugin for DeciderPlugin {
    fn name(&self) -> &'static str {
        "decider"
    }

    async fn call(
        &self,
        input: &ApplicantInput,
        result: ResolutionMap,
        next: Next<'_>,
    ) -> Result<ResolutionMap, ResolverError> {
        let decision = Self::decide(input, &result);
        tracing::debug!(
            passed = decision.passed(),
            failed = decision.failed_checks.len(),
            "decision computed"
        );
        next.merge(result, [(CheckName::Decider, decision.into())])
            .await
    }
}
