//! Per-vendor results and the accumulated resolution map.
//!
//! A [`VendorResult`] is created once per plugin invocation and never
//! mutated afterward; later stages add *new* named entries to the
//! [`ResolutionMap`] rather than editing existing ones. The map itself is
//! copy-on-write: each merge clones and extends, so a plugin can never
//! observe a half-written sibling entry.

use std::collections::{BTreeMap, BTreeSet};

use bon::Builder;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};

use crate::error::VendorError;

/// A PII attribute a vendor can verify or fail.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    FirstName,
    LastName,
    Dob,
    Address,
    Ssn,
    Zipcode,
}

/// Why a plugin skipped its vendor call. Skips are not errors: they are
/// successful invocations producing a `success: false` sub-result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoStateId,
    NoAddressOfResidence,
    UnsupportedJurisdiction,
    FeatureDisabled,
}

/// Device-fraud review outcome. `Review` is a soft signal handled
/// out-of-band and passes resolution provisionally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pass,
    Review,
    Reject,
}

/// Normalized outcome of one vendor check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Builder)]
pub struct VendorResult {
    /// Whether the vendor verified the applicant
    #[builder(default)]
    pub success: bool,
    /// Vendor identifier, e.g. `"state_id:registry"`
    #[builder(into)]
    pub vendor_name: String,
    /// Vendor transaction/reference ID for support tracing and idempotent
    /// retries
    #[builder(into)]
    pub transaction_id: Option<String>,
    /// Present when the call failed with a transport error or timeout
    /// after retries were exhausted
    #[builder(into)]
    pub exception: Option<String>,
    /// True when the underlying failure was a timeout
    #[builder(default)]
    pub timed_out: bool,
    /// Per-attribute error messages reported by the vendor
    #[builder(default)]
    pub errors: BTreeMap<String, Vec<String>>,
    /// Attributes the vendor successfully verified
    #[builder(default)]
    pub verified_attributes: BTreeSet<Attribute>,
    /// A failed result may still pass if a secondary check independently
    /// verifies the attributes in
    /// `attributes_requiring_additional_verification`
    #[builder(default)]
    pub can_pass_with_additional_verification: bool,
    /// Attributes a secondary check would need to cover
    #[builder(default)]
    pub attributes_requiring_additional_verification: Vec<Attribute>,
    /// Set when the plugin skipped its vendor call
    pub reason: Option<SkipReason>,
    /// Device-fraud review outcome; only set by the fraud check
    pub review_status: Option<ReviewStatus>,
}

impl VendorResult {
    /// A skip-path result: no vendor was contacted.
    pub fn skipped(vendor_name: impl Into<String>, reason: SkipReason) -> Self {
        Self::builder()
            .vendor_name(vendor_name)
            .reason(reason)
            .build()
    }

    /// A failed result absorbing a vendor-layer error at the plugin
    /// boundary.
    pub fn from_error(vendor_name: impl Into<String>, error: &VendorError) -> Self {
        Self::builder()
            .vendor_name(vendor_name)
            .exception(error.to_string())
            .timed_out(error.timed_out())
            .build()
    }

    /// Success, with no exception recorded.
    pub fn passed(&self) -> bool {
        self.success && self.exception.is_none()
    }
}

/// Name of a slot in the accumulated resolution map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    StateId,
    StateIdAddress,
    AddressOfResidence,
    DeviceFraud,
    Decider,
}

impl std::fmt::Display for CheckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::StateId => "state_id",
            Self::StateIdAddress => "state_id_address",
            Self::AddressOfResidence => "address_of_residence",
            Self::DeviceFraud => "device_fraud",
            Self::Decider => "decider",
        };
        f.write_str(name)
    }
}

/// One named check in the decider's fixed checklist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    StateIdPresent,
    ResidentialAddressPresent,
    DeviceFraudPassed,
    AddressesVerified,
    StateIdVerified,
}

/// Terminal pass/fail outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
}

/// Terminal decision: created exactly once, never revised.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: Outcome,
    /// Every failing check, in checklist order; empty on a pass
    pub failed_checks: Vec<CheckId>,
}

impl Decision {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }
}

/// A value stored in the resolution map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckEntry {
    Vendor(VendorResult),
    Decision(Decision),
}

impl CheckEntry {
    pub fn as_vendor(&self) -> Option<&VendorResult> {
        match self {
            Self::Vendor(result) => Some(result),
            Self::Decision(_) => None,
        }
    }

    pub fn as_decision(&self) -> Option<&Decision> {
        match self {
            Self::Decision(decision) => Some(decision),
            Self::Vendor(_) => None,
        }
    }
}

impl From<VendorResult> for CheckEntry {
    fn from(result: VendorResult) -> Self {
        Self::Vendor(result)
    }
}

impl From<Decision> for CheckEntry {
    fn from(decision: Decision) -> Self {
        Self::Decision(decision)
    }
}

/// Insertion-ordered map from check name to that check's result.
///
/// Grows monotonically as plugins run. Cloning is cheap relative to vendor
/// I/O, so merges clone-and-extend rather than mutating shared state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolutionMap {
    entries: Vec<(CheckName, CheckEntry)>,
}

impl ResolutionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `name`, if a plugin has contributed one.
    pub fn get(&self, name: CheckName) -> Option<&CheckEntry> {
        self.entries
            .iter()
            .find(|(entry_name, _)| *entry_name == name)
            .map(|(_, entry)| entry)
    }

    /// Vendor result for `name`, if present and vendor-shaped.
    pub fn vendor(&self, name: CheckName) -> Option<&VendorResult> {
        self.get(name).and_then(CheckEntry::as_vendor)
    }

    /// The decider's terminal decision, once it has run.
    pub fn decision(&self) -> Option<&Decision> {
        self.get(CheckName::Decider).and_then(CheckEntry::as_decision)
    }

    pub fn contains(&self, name: CheckName) -> bool {
        self.get(name).is_some()
    }

    /// Extend with a named entry, consuming and returning the map.
    ///
    /// A repeated name replaces the earlier entry in place, preserving its
    /// position; plugins own distinct names so this only arises when a
    /// plugin re-files its own slot.
    pub fn with(mut self, name: CheckName, entry: CheckEntry) -> Self {
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(entry_name, _)| *entry_name == name)
        {
            slot.1 = entry;
        } else {
            self.entries.push((name, entry));
        }
        self
    }

    /// Shorthand for merging a vendor result.
    pub fn with_vendor(self, name: CheckName, result: VendorResult) -> Self {
        self.with(name, CheckEntry::Vendor(result))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CheckName, &CheckEntry)> {
        self.entries.iter().map(|(name, entry)| (*name, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ResolutionMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(&name.to_string(), entry)?;
        }
        map.end()
    }
}
