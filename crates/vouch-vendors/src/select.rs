//! Vendor selection: mock fallback and percentage bucketing.
//!
//! Selection is a pure function of config and a stable hash of the
//! session/correlation ID, computed once per resolution and passed down,
//! so every component in one run agrees on the chosen vendor.

use vouch_common::config::VendorSwitchingConfig;

/// Which vendor implementation a resolution run should use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VendorChoice {
    /// The default live vendor
    Primary,
    /// The alternate live vendor, selected by percentage bucketing
    Alternate,
    /// The offline mock vendor
    Mock,
}

/// Choose the vendor for this session.
///
/// The bucket must be stable across processes and releases, so the hash is
/// a fixed FNV-1a rather than the standard library's randomized hasher.
pub fn select_vendor(config: &VendorSwitchingConfig, session_id: &str) -> VendorChoice {
    if config.mock_fallback {
        return VendorChoice::Mock;
    }
    if !config.switching_enabled || config.alternate_percent == 0 {
        return VendorChoice::Primary;
    }
    let bucket = fnv1a(session_id.as_bytes()) % 100;
    if bucket < u64::from(config.alternate_percent.min(100)) {
        VendorChoice::Alternate
    } else {
        VendorChoice::Primary
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100_0000_01b3);
    }
    hash
}
