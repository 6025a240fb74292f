//! Applicant input: everything known about the person being verified at
//! resolution time.
//!
//! Inputs arrive already decrypted from the (out-of-scope) PII store and
//! are immutable for the lifetime of a resolution. At least one of the
//! state ID or the residence address must be present for a plugin to do
//! useful work; plugins treat total absence as "not applicable", never as
//! an error.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// A postal address. No independent lifecycle; always embedded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street address, line 1
    pub line1: String,
    /// Street address, line 2
    pub line2: Option<String>,
    pub city: String,
    /// Two-letter state or territory code
    pub state: String,
    pub zipcode: String,
}

/// Fields read from a state-issued identity document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct StateId {
    /// Document type as printed, e.g. "drivers_license"
    #[builder(into)]
    pub id_type: String,
    #[builder(into)]
    pub number: String,
    /// Two-letter issuing jurisdiction code
    #[builder(into)]
    pub jurisdiction: String,
    #[builder(into)]
    pub first_name: String,
    #[builder(into)]
    pub last_name: String,
    #[builder(into)]
    pub middle_name: Option<String>,
    /// Date of birth, ISO 8601 (`YYYY-MM-DD`)
    #[builder(into)]
    pub dob: Option<String>,
    /// Address printed on the document
    pub address: Address,
}

/// Everything else: SSN, contact details, and session/correlation IDs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct OtherInfo {
    #[builder(into)]
    pub ssn: Option<String>,
    #[builder(into)]
    pub email: Option<String>,
    #[builder(into)]
    pub ip_address: Option<String>,
    /// Correlation ID tying vendor calls back to one verification session
    #[builder(into)]
    pub session_id: Option<String>,
    /// Device-profiling session ID; absent when the fraud-signal widget
    /// never ran
    #[builder(into)]
    pub profiling_session_id: Option<String>,
}

/// Whether the applicant attested that they live at the address on their
/// state ID.
///
/// Ingested once at the boundary. Upstream sources historically carried
/// this as the string `"true"`/`"false"`; anything else is `Unknown`, and
/// `Unknown` is handled explicitly rather than falling through a string
/// comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameAddressAsId {
    Yes,
    No,
    #[default]
    Unknown,
}

impl SameAddressAsId {
    /// Parse a boundary value of unknown provenance.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("true") => Self::Yes,
            Some("false") => Self::No,
            _ => Self::Unknown,
        }
    }

    pub fn is_no(self) -> bool {
        self == Self::No
    }
}

impl From<bool> for SameAddressAsId {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}

/// Immutable input to a resolution attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct ApplicantInput {
    /// State-issued ID, when one was captured
    pub state_id: Option<StateId>,
    /// Address the applicant claims to live at
    pub address_of_residence: Option<Address>,
    /// SSN, contact, and session identifiers
    pub other: Option<OtherInfo>,
    /// Applicant's attestation that the residence matches the ID address
    #[builder(default)]
    pub same_address_as_id: SameAddressAsId,
}

impl ApplicantInput {
    /// Address printed on the state ID, if a state ID was captured.
    pub fn state_id_address(&self) -> Option<&Address> {
        self.state_id.as_ref().map(|id| &id.address)
    }

    /// The residence and ID addresses are both present and identical.
    pub fn addresses_match(&self) -> bool {
        match (self.address_of_residence.as_ref(), self.state_id_address()) {
            (Some(residence), Some(id_address)) => residence == id_address,
            _ => false,
        }
    }

    /// Device-profiling session ID, when the fraud widget ran.
    pub fn profiling_session_id(&self) -> Option<&str> {
        self.other
            .as_ref()
            .and_then(|o| o.profiling_session_id.as_deref())
    }

    /// Session/correlation ID for this verification attempt.
    pub fn session_id(&self) -> Option<&str> {
        self.other.as_ref().and_then(|o| o.session_id.as_deref())
    }
}
