//! # vouch-vendors
//!
//! The vendor-client resilience layer: a bounded-retry HTTP wrapper with
//! jittered backoff, a token keeper with sliding-expiration prefetch, and
//! one client per external verification vendor (state-ID registry,
//! knowledge-based address/SSN verification, device-fraud signal), each
//! with a mock counterpart substitutable behind the same trait.
//!
//! Clients classify every call into success, retryable failure, permanent
//! failure, or timeout, and normalize vendor-proprietary responses into
//! [`vouch_common::VendorResult`] values. Retries never happen above this
//! layer.

pub mod connection;
pub mod device;
pub mod kbv;
pub mod mock;
pub mod registry;
pub mod retry;
pub mod select;
pub mod token;

pub use connection::VendorConnection;
pub use device::{FraudPayload, FraudProofer, LiveFraudClient};
pub use kbv::{KnowledgeBasedClient, ResolutionPayload, ResolutionProofer};
pub use mock::{MockFraudProofer, MockResolutionProofer, MockStateIdProofer};
pub use registry::{RegistryClient, StateIdPayload, StateIdProofer};
pub use retry::{RetryObserver, RetryPolicy};
pub use select::{VendorChoice, select_vendor};
pub use token::TokenKeeper;
