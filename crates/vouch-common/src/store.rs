//! Token cache storage traits and utilities.
//!
//! The token cache is a shared, externally-persisted resource (a
//! distributed cache in production, not in-process memory) keyed by
//! vendor+host. Writes are idempotent last-writer-wins; the design
//! tolerates the benign race where two processes both refresh near the
//! expiration boundary.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::StoreError;

/// A cached vendor bearer credential.
///
/// Replaced wholesale on refresh, never partially patched. `expires_at` is
/// the hard expiration returned by the vendor's auth endpoint;
/// `sliding_expires_at`, when present, controls prefetch timing so callers
/// can refresh before the hard deadline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Bearer token string
    pub token: String,
    /// Hard expiration; the token is unusable at or after this instant
    pub expires_at: DateTime<Utc>,
    /// Soft expiration controlling prefetch; absent when sliding
    /// expiration is disabled
    pub sliding_expires_at: Option<DateTime<Utc>>,
}

impl TokenInfo {
    /// True at or after the hard expiration.
    pub fn hard_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Pluggable storage for cached tokens, with TTL semantics.
///
/// Implementations back onto a fleet-shared cache; `put` sets the entry's
/// TTL to its hard expiration so stale tokens age out on their own.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Get the cached entry for `key`, if present and not hard-expired.
    async fn get(&self, key: &str) -> Option<TokenInfo>;
    /// Persist the given entry, replacing any existing one.
    async fn put(&self, key: &str, entry: TokenInfo) -> Result<(), StoreError>;
    /// Delete the entry for `key`.
    async fn del(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory token store suitable for tests and single-process use.
#[derive(Clone, Default)]
pub struct MemoryTokenStore(Arc<RwLock<HashMap<String, TokenInfo>>>);

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Option<TokenInfo> {
        let entry = self.0.read().await.get(key).cloned()?;
        // Lazy TTL: a hard-expired entry behaves like a cache miss.
        if entry.hard_expired(Utc::now()) {
            return None;
        }
        Some(entry)
    }

    async fn put(&self, key: &str, entry: TokenInfo) -> Result<(), StoreError> {
        self.0.write().await.insert(key.to_owned(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.0.write().await.remove(key);
        Ok(())
    }
}
