//! Request and result types for the streaming fetcher.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Method;
use url::Url;

use super::FetchError;
use super::constants::{
    DEFAULT_MAX_CONNECTIONS_PER_POOL, DEFAULT_MAX_REDIRECTS, DELIVERY_MAX_BYTES, HEADER_TIMEOUT,
    OVERALL_TIMEOUT, RETRY_BASE_DELAY, RETRY_MAX_JITTER,
};
use super::retry::DEFAULT_MAX_RETRIES;

/// Fetch limits shared by every request a client issues unless overridden.
///
/// # Default Values
///
/// - `header_timeout`: 20 seconds
/// - `overall_timeout`: 90 seconds
/// - `max_redirects`: 5
/// - `max_retries`: 3 attempts in total
/// - `retry_base_delay`: 800 ms
/// - `retry_jitter`: up to 250 ms
/// - `max_connections_per_pool`: 20
/// - `max_bytes`: 49 MiB
/// - `ipv4_only`: true
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Bound on the wait for response headers of each hop.
    pub header_timeout: Duration,
    /// Bound on a whole attempt, redirect hops and body included.
    pub overall_timeout: Duration,
    /// Redirect budget per attempt.
    pub max_redirects: u32,
    /// Maximum attempts, including the first one.
    pub max_retries: u32,
    /// Base delay of the exponential backoff.
    pub retry_base_delay: Duration,
    /// Upper bound on the random delay added to each backoff.
    pub retry_jitter: Duration,
    /// Concurrent connection cap for each transport pool (plain, TLS).
    pub max_connections_per_pool: usize,
    /// Hard byte cap on response bodies.
    pub max_bytes: Option<u64>,
    /// Connect over IPv4 only.
    pub ipv4_only: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            header_timeout: HEADER_TIMEOUT,
            overall_timeout: OVERALL_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: RETRY_BASE_DELAY,
            retry_jitter: RETRY_MAX_JITTER,
            max_connections_per_pool: DEFAULT_MAX_CONNECTIONS_PER_POOL,
            max_bytes: Some(DELIVERY_MAX_BYTES),
            ipv4_only: true,
        }
    }
}

/// One fetch, immutable per attempt.
///
/// Redirects do not mutate a request; they derive a new one through
/// [`FetchRequest::redirected_to`] with one less redirect and only the time
/// left on the overall timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Target URL.
    pub url: String,
    /// HTTP method, GET unless overridden.
    pub method: Method,
    /// Header overrides merged over the baseline browser headers.
    pub headers: BTreeMap<String, String>,
    /// Redirects that may still be followed.
    pub max_redirects: u32,
    /// Bound on the wait for response headers of one hop.
    pub header_timeout: Duration,
    /// Time left for the attempt.
    pub overall_timeout: Duration,
    /// Maximum attempts, including the first one.
    pub max_retries: u32,
    /// Base delay of the exponential backoff.
    pub retry_base_delay: Duration,
    /// Upper bound on the random delay added to each backoff.
    pub retry_jitter: Duration,
    /// Hard byte cap on the body.
    pub max_bytes: Option<u64>,
}

impl FetchRequest {
    /// Creates a GET request with the default limits.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_config(url, &FetchConfig::default())
    }

    /// Creates a GET request using the limits of `config`.
    #[must_use]
    pub fn with_config(url: impl Into<String>, config: &FetchConfig) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: BTreeMap::new(),
            max_redirects: config.max_redirects,
            header_timeout: config.header_timeout,
            overall_timeout: config.overall_timeout,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
            retry_jitter: config.retry_jitter,
            max_bytes: config.max_bytes,
        }
    }

    /// Adds or replaces a header override.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Overrides the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Overrides the redirect budget.
    #[must_use]
    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Overrides both timers.
    #[must_use]
    pub fn timeouts(mut self, header_timeout: Duration, overall_timeout: Duration) -> Self {
        self.header_timeout = header_timeout;
        self.overall_timeout = overall_timeout;
        self
    }

    /// Overrides the retry budget and backoff base.
    #[must_use]
    pub fn retries(mut self, max_retries: u32, retry_base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = retry_base_delay;
        self
    }

    /// Overrides the backoff jitter; `Duration::ZERO` makes delays exact.
    #[must_use]
    pub fn jitter(mut self, retry_jitter: Duration) -> Self {
        self.retry_jitter = retry_jitter;
        self
    }

    /// Overrides the byte cap.
    #[must_use]
    pub fn max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Derives the request for the next redirect hop.
    ///
    /// `elapsed` is the time the current hop has consumed; it is taken off the
    /// overall timeout so a chain can never outlive the original deadline.
    /// Returns `None` once the redirect budget is spent.
    #[must_use]
    pub fn redirected_to(&self, next: &Url, elapsed: Duration) -> Option<Self> {
        let max_redirects = self.max_redirects.checked_sub(1)?;
        Some(Self {
            url: next.to_string(),
            max_redirects,
            overall_timeout: self.overall_timeout.saturating_sub(elapsed),
            ..self.clone()
        })
    }
}

/// Resolves a `Location` header value against the URL that returned it.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] when the location cannot be joined or
/// does not lead to an HTTP(S) URL.
pub fn resolve_location(current: &Url, location: &str) -> Result<Url, FetchError> {
    let next = current
        .join(location.trim())
        .map_err(|_| FetchError::invalid_url(location))?;
    match next.scheme() {
        "http" | "https" => Ok(next),
        _ => Err(FetchError::invalid_url(next.as_str())),
    }
}

/// A fully received, size-bounded response body.
#[derive(Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// The complete body.
    pub bytes: Vec<u8>,
    /// Declared or inferred content type; may be empty.
    pub content_type: String,
    /// URL the bytes came from, after redirects.
    pub final_url: String,
}

impl FetchResult {
    /// Creates a result.
    #[must_use]
    pub fn new(
        bytes: Vec<u8>,
        content_type: impl Into<String>,
        final_url: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
            final_url: final_url.into(),
        }
    }

    /// Body length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for an empty body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Media buffers are large; keep them out of debug logs.
impl std::fmt::Debug for FetchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResult")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("final_url", &self.final_url)
            .finish()
    }
}
