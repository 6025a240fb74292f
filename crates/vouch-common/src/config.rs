//! Injected, read-only configuration for a resolution run.
//!
//! The config store is an external collaborator; this crate only defines
//! the shape the core consumes. Nothing caches config values beyond one
//! resolution call except the token keeper's cache entry.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Retry tuning for one vendor endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total bounded attempts, including the first
    pub max_attempts: u32,
    /// Base delay before the first retry, in milliseconds
    pub base_interval_ms: u64,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
    /// Ceiling on any single delay, in milliseconds
    pub max_interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_interval_ms: 250,
            backoff_factor: 2.0,
            max_interval_ms: 5_000,
        }
    }
}

impl RetryConfig {
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

/// Connection settings for one vendor.
#[derive(Clone, Debug, Deserialize)]
pub struct VendorConfig {
    /// Vendor endpoint
    pub base_url: Url,
    /// API key, for vendors using header auth
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-call timeout, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_timeout_seconds() -> u64 {
    10
}

impl VendorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Settings for the token-caching layer of a session-token vendor.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenConfig {
    /// Auth endpoint issuing short-lived bearer tokens
    pub auth_url: Url,
    pub username: String,
    pub password: String,
    /// Cache key override; defaults to `"<vendor>_token:<auth host>"`
    #[serde(default)]
    pub cache_key: Option<String>,
    /// Seconds used to compute the sliding expiration window
    #[serde(default = "default_prefetch_ttl_seconds")]
    pub prefetch_ttl_seconds: u64,
    /// When disabled, only the hard expiration applies
    #[serde(default = "default_true")]
    pub sliding_expiration_enabled: bool,
    /// Per-call timeout against the auth endpoint, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_prefetch_ttl_seconds() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl TokenConfig {
    /// Effective cache key, shared fleet-wide for this vendor+host.
    pub fn cache_key(&self, vendor: &str) -> String {
        self.cache_key.clone().unwrap_or_else(|| {
            let host = self.auth_url.host_str().unwrap_or("unknown");
            format!("{vendor}_token:{host}")
        })
    }

    pub fn prefetch_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.prefetch_ttl_seconds as i64)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Mock-vs-real vendor selection and percentage bucketing.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct VendorSwitchingConfig {
    /// Route every call to the mock vendor (test/offline environments)
    pub mock_fallback: bool,
    /// Whether alternate-vendor bucketing is evaluated at all
    pub switching_enabled: bool,
    /// Percentage of sessions (0-100) bucketed to the alternate vendor
    pub alternate_percent: u8,
}

/// Top-level configuration consumed by the proofing core.
#[derive(Clone, Debug, Deserialize)]
pub struct ProofingConfig {
    /// Knowledge-based address/SSN verification vendor
    pub resolution: VendorConfig,
    /// Alternate knowledge-based vendor, used when percentage bucketing
    /// selects it
    #[serde(default)]
    pub resolution_alternate: Option<VendorConfig>,
    /// State-ID registry vendor
    pub state_id: VendorConfig,
    /// Token settings for the state-ID registry's session auth
    pub state_id_token: TokenConfig,
    /// Jurisdictions the registry can verify; others skip
    #[serde(default)]
    pub supported_jurisdictions: BTreeSet<String>,
    /// Device-fraud signal vendor
    pub device: VendorConfig,
    /// Master switch for device-profiling collection
    #[serde(default)]
    pub device_profiling_enabled: bool,
    #[serde(default)]
    pub switching: VendorSwitchingConfig,
}
