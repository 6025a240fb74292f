//! Bearer-token caching with sliding-expiration prefetch.
//!
//! The cache entry carries a hard `expires_at` (from the vendor's auth
//! endpoint) and, when sliding expiration is enabled, a
//! `sliding_expires_at` initialized to `expires_at - 3 * prefetch_ttl`.
//! State machine on access:
//!
//! - **fresh** (`now < sliding_expires_at`): serve the cached token.
//! - **soft-expired** (`sliding_expires_at <= now <=
//!   sliding_expires_at + prefetch_ttl`): extend the sliding window by
//!   `prefetch_ttl`, save, and keep serving the stale-but-valid token so
//!   the request path pays no auth latency.
//! - **hard-expired** (past the extended window, or past `expires_at`):
//!   block and fetch a new token before proceeding.
//!
//! The initial sliding window is jittered ±0.5 s so a fleet sharing one
//! cache key staggers its refreshes against the vendor's auth endpoint.
//! The store is last-writer-wins; two processes refreshing near the
//! boundary is a benign race.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use vouch_common::{
    AuthError, HttpTransport, StoreError, TokenConfig, TokenInfo, TokenStore, VendorError,
};

use crate::connection::VendorConnection;
use crate::retry::RetryPolicy;

/// Caches a short-lived vendor bearer credential in a shared store.
pub struct TokenKeeper<S, T> {
    store: Arc<S>,
    connection: VendorConnection<T>,
    config: TokenConfig,
    cache_key: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    /// Hard expiration as a millisecond epoch timestamp
    expires: Option<i64>,
    error: Option<TokenErrorEnvelope>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorEnvelope {
    code: Option<i64>,
    message: Option<String>,
}

impl<S: TokenStore, T: HttpTransport> TokenKeeper<S, T> {
    pub fn new(store: Arc<S>, transport: Arc<T>, vendor: &str, config: TokenConfig) -> Self {
        let cache_key = config.cache_key(vendor);
        let connection = VendorConnection::with_settings(
            transport,
            format!("{vendor}_token"),
            config.timeout(),
            RetryPolicy::new(config.retry.clone()),
        );
        Self {
            store,
            connection,
            config,
            cache_key,
        }
    }

    /// The current bearer token, fetching or refreshing as needed.
    pub async fn token(&self) -> Result<String, VendorError> {
        Ok(self.token_entry().await?.token)
    }

    /// The current cache entry, applying the sliding-expiration state
    /// machine described at module level.
    pub async fn token_entry(&self) -> Result<TokenInfo, VendorError> {
        let Some(entry) = self.store.get(&self.cache_key).await else {
            return self.refresh().await;
        };
        if !self.config.sliding_expiration_enabled {
            return Ok(entry);
        }
        let now = Utc::now();
        match entry.sliding_expires_at {
            Some(sliding) if now >= sliding => {
                if now > sliding + self.config.prefetch_ttl() {
                    // Past the extended window: fetch before proceeding.
                    self.refresh().await
                } else {
                    // Soft-expired: extend the window and keep serving the
                    // stale-but-valid token.
                    let extended = TokenInfo {
                        sliding_expires_at: Some(sliding + self.config.prefetch_ttl()),
                        ..entry
                    };
                    self.store.put(&self.cache_key, extended.clone()).await?;
                    Ok(extended)
                }
            }
            _ => Ok(entry),
        }
    }

    /// Drop the cached token so the next call fetches a fresh one.
    pub async fn remove(&self) -> Result<(), StoreError> {
        self.store.del(&self.cache_key).await
    }

    async fn refresh(&self) -> Result<TokenInfo, VendorError> {
        let response: TokenResponse = self
            .connection
            .post_form(
                &self.config.auth_url,
                &[
                    ("username", self.config.username.as_str()),
                    ("password", self.config.password.as_str()),
                    ("f", "json"),
                ],
            )
            .await?;

        if let Some(envelope) = response.error {
            return Err(VendorError::Envelope {
                code: envelope.code,
                message: envelope
                    .message
                    .unwrap_or_else(|| "token request rejected".into()),
            });
        }
        let (Some(token), Some(expires_ms)) = (response.token, response.expires) else {
            return Err(VendorError::Auth(AuthError::RefreshFailed));
        };
        let expires_at = DateTime::from_timestamp_millis(expires_ms)
            .ok_or(VendorError::Auth(AuthError::RefreshFailed))?;

        let entry = TokenInfo {
            token,
            expires_at,
            sliding_expires_at: self
                .config
                .sliding_expiration_enabled
                .then(|| expires_at - self.config.prefetch_ttl() * 3 + refresh_jitter()),
        };
        self.store.put(&self.cache_key, entry.clone()).await?;
        Ok(entry)
    }
}

/// ±0.5 s offset applied to the initial sliding window.
fn refresh_jitter() -> Duration {
    Duration::milliseconds(rand::rng().random_range(-500..=500))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use vouch_common::{MemoryTokenStore, TransportError};

    struct CountingAuthTransport {
        calls: AtomicU32,
    }

    impl CountingAuthTransport {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpTransport for CountingAuthTransport {
        async fn send(
            &self,
            _request: http::Request<Vec<u8>>,
        ) -> Result<http::Response<Vec<u8>>, TransportError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let expires_ms = (Utc::now() + Duration::hours(1)).timestamp_millis();
            let body = serde_json::to_vec(&serde_json::json!({
                "token": format!("token-{n}"),
                "expires": expires_ms,
            }))
            .unwrap();
            Ok(http::Response::builder().status(200).body(body).unwrap())
        }
    }

    fn token_config() -> TokenConfig {
        serde_json::from_value(serde_json::json!({
            "auth_url": "https://registry.example.com/token",
            "username": "svc",
            "password": "hunter2",
            "prefetch_ttl_seconds": 10
        }))
        .unwrap()
    }

    fn keeper(
        store: Arc<MemoryTokenStore>,
        transport: Arc<CountingAuthTransport>,
    ) -> TokenKeeper<MemoryTokenStore, CountingAuthTransport> {
        TokenKeeper::new(store, transport, "registry", token_config())
    }

    #[tokio::test]
    async fn cache_miss_fetches_and_saves() {
        let store = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(CountingAuthTransport::new());
        let keeper = keeper(store.clone(), transport.clone());

        let token = keeper.token().await.unwrap();
        assert_eq!(token, "token-1");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        let entry = store.get(&keeper.cache_key).await.unwrap();
        let sliding = entry.sliding_expires_at.unwrap();
        // Initial window is expires_at - 3 * prefetch_ttl, within jitter.
        let offset = (entry.expires_at - sliding).num_milliseconds();
        assert!((29_500..=30_500).contains(&offset), "offset {offset}");
    }

    #[tokio::test]
    async fn fresh_token_is_served_without_auth_call() {
        let store = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(CountingAuthTransport::new());
        let keeper = keeper(store.clone(), transport.clone());

        let entry = TokenInfo {
            token: "cached".into(),
            expires_at: Utc::now() + Duration::hours(1),
            sliding_expires_at: Some(Utc::now() + Duration::minutes(30)),
        };
        store.put(&keeper.cache_key, entry).await.unwrap();

        assert_eq!(keeper.token().await.unwrap(), "cached");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn soft_expiry_extends_window_exactly_once() {
        let store = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(CountingAuthTransport::new());
        let keeper = keeper(store.clone(), transport.clone());

        let sliding = Utc::now() - Duration::seconds(1);
        let entry = TokenInfo {
            token: "cached".into(),
            expires_at: Utc::now() + Duration::hours(1),
            sliding_expires_at: Some(sliding),
        };
        store.put(&keeper.cache_key, entry).await.unwrap();

        // First call: serves the stale-but-valid token, extends the window,
        // makes no auth call.
        assert_eq!(keeper.token().await.unwrap(), "cached");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        let extended = store.get(&keeper.cache_key).await.unwrap();
        assert_eq!(
            extended.sliding_expires_at.unwrap(),
            sliding + Duration::seconds(10)
        );

        // Second call inside the new window: no further extension.
        assert_eq!(keeper.token().await.unwrap(), "cached");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        let unchanged = store.get(&keeper.cache_key).await.unwrap();
        assert_eq!(unchanged.sliding_expires_at, extended.sliding_expires_at);
    }

    #[tokio::test]
    async fn past_extended_window_fetches_synchronously() {
        let store = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(CountingAuthTransport::new());
        let keeper = keeper(store.clone(), transport.clone());

        let entry = TokenInfo {
            token: "stale".into(),
            expires_at: Utc::now() + Duration::hours(1),
            sliding_expires_at: Some(Utc::now() - Duration::seconds(30)),
        };
        store.put(&keeper.cache_key, entry).await.unwrap();

        assert_eq!(keeper.token().await.unwrap(), "token-1");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn remove_busts_the_cache() {
        let store = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(CountingAuthTransport::new());
        let keeper = keeper(store.clone(), transport.clone());

        keeper.token().await.unwrap();
        keeper.remove().await.unwrap();
        keeper.token().await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }
}
