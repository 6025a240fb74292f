//! Mock vendor clients for test and offline environments.
//!
//! Substitutable behind the same traits as the live clients; the
//! mock-vs-real switch is a single config flag (see [`crate::select`]).
//! Mocks record call counts and payloads so tests can assert, for
//! example, that a skip path made zero vendor calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use vouch_common::{Attribute, VendorError, VendorResult};

use crate::device::{FraudPayload, FraudProofer};
use crate::kbv::{ResolutionPayload, ResolutionProofer};
use crate::registry::{StateIdPayload, StateIdProofer};

fn passing(vendor_name: &str) -> VendorResult {
    VendorResult::builder()
        .success(true)
        .vendor_name(vendor_name)
        .transaction_id("mock-0000")
        .verified_attributes(
            [
                Attribute::FirstName,
                Attribute::LastName,
                Attribute::Dob,
                Attribute::Address,
            ]
            .into(),
        )
        .build()
}

/// Mock state-ID proofer.
pub struct MockStateIdProofer {
    result: VendorResult,
    calls: AtomicU32,
    pub payloads: Arc<Mutex<Vec<StateIdPayload>>>,
}

impl MockStateIdProofer {
    pub fn passing() -> Self {
        Self::returning(passing("state_id:mock"))
    }

    pub fn returning(result: VendorResult) -> Self {
        Self {
            result,
            calls: AtomicU32::new(0),
            payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateIdProofer for MockStateIdProofer {
    fn vendor_name(&self) -> &str {
        "state_id:mock"
    }

    async fn proof(&self, payload: &StateIdPayload) -> Result<VendorResult, VendorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().await.push(payload.clone());
        Ok(self.result.clone())
    }
}

/// Mock knowledge-based proofer.
pub struct MockResolutionProofer {
    result: VendorResult,
    calls: AtomicU32,
    pub payloads: Arc<Mutex<Vec<ResolutionPayload>>>,
}

impl MockResolutionProofer {
    pub fn passing() -> Self {
        Self::returning(passing("resolution:mock"))
    }

    pub fn returning(result: VendorResult) -> Self {
        Self {
            result,
            calls: AtomicU32::new(0),
            payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResolutionProofer for MockResolutionProofer {
    fn vendor_name(&self) -> &str {
        "resolution:mock"
    }

    async fn proof(&self, payload: &ResolutionPayload) -> Result<VendorResult, VendorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().await.push(payload.clone());
        Ok(self.result.clone())
    }
}

/// Mock device-fraud proofer.
pub struct MockFraudProofer {
    result: VendorResult,
    calls: AtomicU32,
}

impl MockFraudProofer {
    pub fn passing() -> Self {
        Self::returning(
            VendorResult::builder()
                .success(true)
                .vendor_name("device_fraud:mock")
                .review_status(vouch_common::ReviewStatus::Pass)
                .build(),
        )
    }

    pub fn returning(result: VendorResult) -> Self {
        Self {
            result,
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FraudProofer for MockFraudProofer {
    fn vendor_name(&self) -> &str {
        "device_fraud:mock"
    }

    async fn proof(&self, _payload: &FraudPayload) -> Result<VendorResult, VendorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}
