//! # vouch-resolve
//!
//! The resolution pipeline: a continuation-passing chain of per-vendor
//! plugins ([`IdentityResolver`]), a terminal checklist decider
//! ([`plugins::DeciderPlugin`]), and the alternate non-chained
//! adjudication path ([`ResultAdjudicator`]) used when the four vendor
//! checks are obtained independently.
//!
//! Plugins absorb vendor failures into failed
//! [`vouch_common::VendorResult`]s so one vendor outage degrades a
//! resolution instead of aborting it; genuine programming errors
//! propagate as [`ResolverError`] and are never swallowed.

pub mod adjudicator;
pub mod error;
pub mod events;
pub mod plugins;
pub mod proofer;
pub mod resolver;

pub use adjudicator::{AdjudicatedResult, AdjudicationReason, ResultAdjudicator};
pub use error::ResolverError;
pub use events::{
    CheckOutcomeEvent, DecisionEvent, EventSink, NullSink, RecordingSink, RetryEvent,
    SinkRetryObserver, TracingSink,
};
pub use proofer::ProgressiveProofer;
pub use resolver::{IdentityResolver, Next, ResolutionPlugin};
