//! # Vouch
//!
//! Identity resolution and proofing adjudication: a continuation-passing
//! chain of per-vendor verification plugins, a checklist decider, and a
//! precedence-ordered result adjudicator, over a resilient vendor-client
//! layer (bounded retries with jittered backoff, sliding-expiration token
//! caching, mock fallbacks).
//!
//! ## Example
//!
//! Resolve one applicant against mock vendors and adjudicate:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use vouch::resolve::ProgressiveProofer;
//! use vouch::resolve::events::TracingSink;
//! use vouch::vendors::mock::{
//!     MockFraudProofer, MockResolutionProofer, MockStateIdProofer,
//! };
//! use vouch::{Address, ApplicantInput, StateId};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let address = Address {
//!     line1: "1 Main St".into(),
//!     line2: None,
//!     city: "Bayside".into(),
//!     state: "NY".into(),
//!     zipcode: "11361".into(),
//! };
//! let input = ApplicantInput::builder()
//!     .state_id(
//!         StateId::builder()
//!             .id_type("drivers_license")
//!             .number("D123456789")
//!             .jurisdiction("NY")
//!             .first_name("Ada")
//!             .last_name("Lovelace")
//!             .address(address.clone())
//!             .build(),
//!     )
//!     .address_of_residence(address)
//!     .build();
//!
//! let proofer = ProgressiveProofer::builder()
//!     .resolution(Arc::new(MockResolutionProofer::passing()))
//!     .state_id(Arc::new(MockStateIdProofer::passing()))
//!     .fraud(Arc::new(MockFraudProofer::passing()))
//!     .events(Arc::new(TracingSink))
//!     .supported_jurisdictions(["NY".to_string()].into())
//!     .build();
//!
//! let outcome = proofer.proof_and_adjudicate(&input).await.unwrap();
//! assert!(outcome.success);
//! # }
//! ```

pub use vouch_common::{
    Address, ApplicantInput, Attribute, CheckEntry, CheckId, CheckName, Decision, OtherInfo,
    Outcome, ProofingConfig, ResolutionMap, ReviewStatus, SameAddressAsId, SkipReason, StateId,
    VendorError, VendorResult,
};
pub use vouch_resolve::{
    AdjudicatedResult, AdjudicationReason, EventSink, IdentityResolver, ProgressiveProofer,
    ResolutionPlugin, ResolverError, ResultAdjudicator,
};

/// Shared types, transports, stores, and configuration.
pub use vouch_common as common;
/// Vendor clients and the resilience layer.
pub use vouch_vendors as vendors;
/// The resolution pipeline.
pub use vouch_resolve as resolve;
