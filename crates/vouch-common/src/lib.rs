//! # vouch-common
//!
//! Shared building blocks for the Vouch identity-proofing workspace:
//! applicant input and vendor result types, the error taxonomy, the HTTP
//! transport abstraction vendor clients are written against, and the token
//! store used by the credential-caching layer.
//!
//! Nothing in this crate talks to a vendor directly; see `vouch-vendors`
//! for the resilience layer and `vouch-resolve` for the pipeline.

pub mod config;
pub mod error;
pub mod input;
pub mod result;
pub mod store;
pub mod transport;

pub use config::{ProofingConfig, RetryConfig, TokenConfig, VendorConfig, VendorSwitchingConfig};
pub use error::{AuthError, HttpError, StoreError, TransportError, VendorError};
pub use input::{Address, ApplicantInput, OtherInfo, SameAddressAsId, StateId};
pub use result::{
    Attribute, CheckEntry, CheckId, CheckName, Decision, Outcome, ResolutionMap, ReviewStatus,
    SkipReason, VendorResult,
};
pub use store::{MemoryTokenStore, TokenInfo, TokenStore};
pub use transport::HttpTransport;
