//! Structured audit events emitted by the pipeline.
//!
//! The sink is an injected collaborator owning the final event schema;
//! the core's obligation is one event per plugin outcome and exactly one
//! terminal decision event per resolution attempt, carrying non-PII
//! metadata only.

use std::sync::Mutex;

use vouch_common::{CheckId, CheckName, SkipReason};

/// Outcome of one plugin/check invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckOutcomeEvent {
    pub check: CheckName,
    pub vendor_name: String,
    pub success: bool,
    /// Set when the plugin skipped its vendor call
    pub reason: Option<SkipReason>,
    pub timed_out: bool,
}

/// Terminal decision for one resolution attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionEvent {
    pub passed: bool,
    /// Every failing check, in checklist order
    pub failed_checks: Vec<CheckId>,
    /// True when a plugin stopped the chain before the decider ran
    pub short_circuited: bool,
}

/// One retry of a vendor call, surfaced from the resilience layer.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryEvent {
    pub vendor_name: String,
    pub attempt: u32,
    pub next_retry_ms: u64,
}

/// Analytics/audit sink for pipeline events.
pub trait EventSink: Send + Sync {
    fn check_completed(&self, event: CheckOutcomeEvent);
    fn decision_made(&self, event: DecisionEvent);
    fn vendor_retried(&self, _event: RetryEvent) {}
}

/// Bridges the resilience layer's retry notifications into the sink, for
/// wiring as [`vouch_vendors::RetryObserver`] on a retry policy.
pub struct SinkRetryObserver(pub std::sync::Arc<dyn EventSink>);

impl vouch_vendors::RetryObserver for SinkRetryObserver {
    fn retried(&self, vendor: &str, attempt: u32, next_retry: std::time::Duration) {
        self.0.vendor_retried(RetryEvent {
            vendor_name: vendor.to_string(),
            attempt,
            next_retry_ms: next_retry.as_millis() as u64,
        });
    }
}

/// Sink that forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn check_completed(&self, event: CheckOutcomeEvent) {
        tracing::info!(
            check = %event.check,
            vendor = %event.vendor_name,
            success = event.success,
            reason = ?event.reason,
            timed_out = event.timed_out,
            "proofing check completed"
        );
    }

    fn decision_made(&self, event: DecisionEvent) {
        tracing::info!(
            passed = event.passed,
            failed_checks = ?event.failed_checks,
            short_circuited = event.short_circuited,
            "proofing decision made"
        );
    }
}

/// Sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn check_completed(&self, _event: CheckOutcomeEvent) {}
    fn decision_made(&self, _event: DecisionEvent) {}
}

/// Sink that records events for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub checks: Mutex<Vec<CheckOutcomeEvent>>,
    pub decisions: Mutex<Vec<DecisionEvent>>,
    pub retries: Mutex<Vec<RetryEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decision_count(&self) -> usize {
        self.decisions.lock().expect("sink poisoned").len()
    }
}

impl EventSink for RecordingSink {
    fn check_completed(&self, event: CheckOutcomeEvent) {
        self.checks.lock().expect("sink poisoned").push(event);
    }

    fn decision_made(&self, event: DecisionEvent) {
        self.decisions.lock().expect("sink poisoned").push(event);
    }

    fn vendor_retried(&self, event: RetryEvent) {
        self.retries.lock().expect("sink poisoned").push(event);
    }
}
