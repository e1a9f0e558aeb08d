//! Constants for the download module (timeouts, retry, size limits).

use std::time::Duration;

/// Default bound on a whole attempt, body transfer included (90 seconds).
pub const OVERALL_TIMEOUT: Duration = Duration::from_secs(90);

/// Default bound on the wait for response headers (20 seconds).
pub const HEADER_TIMEOUT: Duration = Duration::from_secs(20);

/// Default redirect budget per attempt.
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Default base delay for exponential backoff (800 milliseconds).
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(800);

/// Default upper bound on the random delay added to each backoff (250 milliseconds).
pub const RETRY_MAX_JITTER: Duration = Duration::from_millis(250);

/// Default cap on concurrent connections per transport pool.
pub const DEFAULT_MAX_CONNECTIONS_PER_POOL: usize = 20;

/// Hard byte cap just below the 50 MB bot upload limit of the delivery platform.
pub const DELIVERY_MAX_BYTES: u64 = 49 * 1024 * 1024;

/// Upper bound on how much of a redirect body is drained before the response is dropped.
pub const REDIRECT_DRAIN_LIMIT: usize = 64 * 1024;
