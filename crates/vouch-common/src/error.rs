//! Error types for vendor clients and the token layer.

use http::StatusCode;

/// Transport-level errors that occur during HTTP communication
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TransportError {
    /// Failed to establish connection to the vendor
    #[error("connection error: {0}")]
    Connect(String),

    /// Request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Request construction failed (malformed URI, headers, etc.)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Other transport error
    #[error("transport error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "reqwest-client")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() || e.is_request() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Other(Box::new(e))
        }
    }
}

/// Non-2xx HTTP response from a vendor endpoint
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub struct HttpError {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body if available
    pub body: Option<String>,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(body) = &self.body {
            write!(f, ":\n{body}")?;
        }
        Ok(())
    }
}

/// Authentication errors raised by the token-caching layer
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum AuthError {
    /// Cached bearer token has hard-expired and could not be replaced
    #[error("bearer token expired")]
    TokenExpired,

    /// Token fetch against the vendor auth endpoint failed
    #[error("token refresh failed")]
    RefreshFailed,

    /// Vendor requires credentials that were not configured
    #[error("missing vendor credentials")]
    MissingCredentials,
}

/// Errors emitted by token stores.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StoreError {
    /// Serialization error (e.g., JSON)
    #[error("serialization error: {0}")]
    #[diagnostic(code(vouch::token_store::serde))]
    Serde(#[from] serde_json::Error),
    /// Any other error from a backend implementation
    #[error(transparent)]
    #[diagnostic(code(vouch::token_store::other))]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Error type wrapping everything that can go wrong on a single vendor call.
///
/// The retry layer consults [`VendorError::is_retryable`]; plugins convert
/// whatever survives retry into a failed
/// [`VendorResult`](crate::result::VendorResult) rather than letting it
/// propagate past the plugin boundary.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum VendorError {
    /// HTTP transport error
    #[error("HTTP transport error: {0}")]
    Transport(
        #[from]
        #[diagnostic_source]
        TransportError,
    ),

    /// HTTP error response
    #[error("{0}")]
    Http(
        #[from]
        #[diagnostic_source]
        HttpError,
    ),

    /// 2xx response carrying a vendor-embedded error envelope. Permanent;
    /// never retried.
    #[error("vendor error{}: {message}", code.map(|c| format!(" {c}")).unwrap_or_default())]
    Envelope {
        /// Vendor-reported error code, if any
        code: Option<i64>,
        /// Vendor-reported message
        message: String,
    },

    /// Response deserialization failed
    #[error("failed to deserialize vendor response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Authentication error
    #[error("authentication error: {0}")]
    Auth(
        #[from]
        #[diagnostic_source]
        AuthError,
    ),

    /// Token store error
    #[error("token store error: {0}")]
    Store(
        #[from]
        #[diagnostic_source]
        StoreError,
    ),

    /// Bounded retries were exhausted; `last` is the final attempt's error
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made, including the first
        attempts: u32,
        /// Error from the final attempt
        last: Box<VendorError>,
    },
}

impl VendorError {
    /// Whether the retry layer may try this call again.
    ///
    /// Timeouts and connection failures are retryable, as are the HTTP
    /// statuses vendors use for transient conditions (404, 408, 409, 421,
    /// 429, and all 5xx). Vendor error envelopes, decode failures, and
    /// exhausted retries are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(TransportError::Timeout | TransportError::Connect(_)) => true,
            Self::Transport(_) => false,
            Self::Http(HttpError { status, .. }) => {
                status.is_server_error()
                    || matches!(status.as_u16(), 404 | 408 | 409 | 421 | 429)
            }
            _ => false,
        }
    }

    /// Whether a timeout was the underlying failure, looking through the
    /// retries-exhausted wrapper.
    pub fn timed_out(&self) -> bool {
        match self {
            Self::Transport(TransportError::Timeout) => true,
            Self::RetriesExhausted { last, .. } => last.timed_out(),
            _ => false,
        }
    }
}
