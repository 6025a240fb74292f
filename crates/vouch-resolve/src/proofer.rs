//! High-level orchestration: wires the standard plugin chain, runs it, and
//! folds the accumulated map through the adjudicator.
//!
//! Callers that obtain vendor results out-of-band can use
//! [`ResultAdjudicator`](crate::adjudicator::ResultAdjudicator) directly;
//! this type is the chained path.

use std::collections::BTreeSet;
use std::sync::Arc;

use bon::Builder;
use vouch_common::{
    ApplicantInput, CheckName, HttpTransport, ProofingConfig, ResolutionMap, TokenStore,
    VendorResult,
};
use vouch_vendors::connection::VendorConnection;
use vouch_vendors::device::{FraudProofer, LiveFraudClient};
use vouch_vendors::kbv::{ALTERNATE_VENDOR_NAME, KnowledgeBasedClient, ResolutionProofer};
use vouch_vendors::mock::{MockFraudProofer, MockResolutionProofer, MockStateIdProofer};
use vouch_vendors::registry::{RegistryClient, StateIdProofer};
use vouch_vendors::select::{VendorChoice, select_vendor};
use vouch_vendors::token::TokenKeeper;

use crate::adjudicator::{AdjudicatedResult, ResultAdjudicator};
use crate::error::ResolverError;
use crate::events::EventSink;
use crate::plugins::{DeciderPlugin, DeviceFraudPlugin, KnowledgeBasedPlugin, StateIdPlugin};
use crate::resolver::{IdentityResolver, ResolutionPlugin};

/// Runs the standard chain (knowledge-based, state-ID, device-fraud,
/// decider) and adjudicates the outcome.
#[derive(Builder)]
pub struct ProgressiveProofer {
    resolution: Arc<dyn ResolutionProofer>,
    state_id: Arc<dyn StateIdProofer>,
    fraud: Arc<dyn FraudProofer>,
    events: Arc<dyn EventSink>,
    #[builder(default)]
    supported_jurisdictions: BTreeSet<String>,
    #[builder(default = true)]
    device_profiling_enabled: bool,
    /// The flow requires a state-ID check.
    #[builder(default = true)]
    should_proof_state_id: bool,
    #[builder(default)]
    ipp_enrollment_in_progress: bool,
    #[builder(default)]
    double_address_verification: bool,
}

impl ProgressiveProofer {
    /// Assemble the standard proofer from injected config.
    ///
    /// Vendor selection is computed once here from the session ID and
    /// holds for the whole run: the mock fallback routes every check to
    /// mocks, and percentage bucketing may route the knowledge-based
    /// check to the alternate vendor.
    pub fn from_config<S, T>(
        config: &ProofingConfig,
        transport: Arc<T>,
        store: Arc<S>,
        session_id: &str,
        events: Arc<dyn EventSink>,
    ) -> Self
    where
        S: TokenStore + 'static,
        T: HttpTransport + 'static,
    {
        let choice = select_vendor(&config.switching, session_id);
        let resolution: Arc<dyn ResolutionProofer> = match choice {
            VendorChoice::Mock => Arc::new(MockResolutionProofer::passing()),
            VendorChoice::Alternate => {
                let kbv_config = config
                    .resolution_alternate
                    .as_ref()
                    .unwrap_or(&config.resolution);
                Arc::new(
                    KnowledgeBasedClient::new(
                        VendorConnection::new(transport.clone(), ALTERNATE_VENDOR_NAME, kbv_config),
                        kbv_config,
                    )
                    .with_vendor_name(ALTERNATE_VENDOR_NAME),
                )
            }
            VendorChoice::Primary => Arc::new(KnowledgeBasedClient::new(
                VendorConnection::new(transport.clone(), "resolution:kbv", &config.resolution),
                &config.resolution,
            )),
        };
        let state_id: Arc<dyn StateIdProofer> = match choice {
            VendorChoice::Mock => Arc::new(MockStateIdProofer::passing()),
            _ => Arc::new(RegistryClient::new(
                VendorConnection::new(transport.clone(), "state_id:registry", &config.state_id),
                TokenKeeper::new(
                    store,
                    transport.clone(),
                    "registry",
                    config.state_id_token.clone(),
                ),
                &config.state_id,
            )),
        };
        let fraud: Arc<dyn FraudProofer> = match choice {
            VendorChoice::Mock => Arc::new(MockFraudProofer::passing()),
            _ => Arc::new(LiveFraudClient::new(
                VendorConnection::new(transport, "device_fraud:ddp", &config.device),
                &config.device,
            )),
        };

        Self::builder()
            .resolution(resolution)
            .state_id(state_id)
            .fraud(fraud)
            .events(events)
            .supported_jurisdictions(config.supported_jurisdictions.clone())
            .device_profiling_enabled(config.device_profiling_enabled)
            .build()
    }

    /// The standard plugin chain, in its fixed order.
    pub fn resolver(&self) -> IdentityResolver {
        let plugins: Vec<Arc<dyn ResolutionPlugin>> = vec![
            Arc::new(KnowledgeBasedPlugin::new(
                self.resolution.clone(),
                self.events.clone(),
            )),
            Arc::new(StateIdPlugin::new(
                self.state_id.clone(),
                self.events.clone(),
                self.supported_jurisdictions.clone(),
            )),
            Arc::new(DeviceFraudPlugin::new(
                self.fraud.clone(),
                self.events.clone(),
                self.device_profiling_enabled,
            )),
            Arc::new(DeciderPlugin::new()),
        ];
        IdentityResolver::new(plugins, self.events.clone())
    }

    /// Run the chain and return the raw accumulated map.
    pub async fn proof(&self, input: &ApplicantInput) -> Result<ResolutionMap, ResolverError> {
        self.resolver().resolve_identity(input).await
    }

    /// Run the chain, then adjudicate the four vendor results.
    pub async fn proof_and_adjudicate(
        &self,
        input: &ApplicantInput,
    ) -> Result<AdjudicatedResult, ResolverError> {
        let map = self.proof(input).await?;
        Ok(self.adjudicate(input, &map))
    }

    /// Fold an accumulated map into a final adjudicated outcome. Slots a
    /// short-circuited chain never filled count as failed checks.
    pub fn adjudicate(&self, input: &ApplicantInput, map: &ResolutionMap) -> AdjudicatedResult {
        ResultAdjudicator::builder()
            .resolution_result(Self::slot(map, CheckName::StateIdAddress))
            .residential_resolution_result(Self::slot(map, CheckName::AddressOfResidence))
            .state_id_result(Self::slot(map, CheckName::StateId))
            .device_fraud_result(Self::slot(map, CheckName::DeviceFraud))
            .should_proof_state_id(self.should_proof_state_id)
            .ipp_enrollment_in_progress(self.ipp_enrollment_in_progress)
            .double_address_verification(self.double_address_verification)
            .same_address_as_id(input.same_address_as_id)
            .build()
            .adjudicate()
    }

    fn slot(map: &ResolutionMap, name: CheckName) -> VendorResult {
        map.vendor(name).cloned().unwrap_or_else(|| {
            VendorResult::builder()
                .vendor_name(format!("{name}:never_ran"))
                .build()
        })
    }
}
