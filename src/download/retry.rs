//! Retry logic with exponential backoff for transient fetch failures.
//!
//! When a fetch attempt fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - transport trouble that may clear on retry
//! - [`FailureType::Permanent`] - everything else (HTTP status, size cap,
//!   redirect budget, overall deadline, bad input)
//!
//! The [`RetryPolicy`] then decides whether another attempt is allowed and how
//! long to sleep first.
//!
//! # Example
//!
//! ```
//! use mediagrab_core::download::{FetchError, RetryPolicy, RetryDecision, classify_error};
//!
//! let policy = RetryPolicy::default();
//! let error = FetchError::http_status("https://example.com/video.mp4", 503);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use super::constants::RETRY_MAX_JITTER;
use super::{FetchError, TimeoutKind};

/// Default maximum attempts, including the first one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff (800 milliseconds).
const DEFAULT_BASE_DELAY: Duration = super::constants::RETRY_BASE_DELAY;

/// Default maximum delay cap (30 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Default backoff multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;

/// Classification of fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Transport-level failure that may succeed on retry.
    ///
    /// Examples: connection refused or reset, DNS failure, header timeout,
    /// body stream dropped mid-transfer.
    Transient,

    /// Failure that another attempt would not fix.
    ///
    /// Examples: any HTTP status, byte cap exceeded, redirect budget spent,
    /// overall deadline expired, invalid URL.
    Permanent,
}

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Delay Calculation
///
/// ```text
/// delay = min(base_delay * multiplier^(attempt-1), max_delay) + jitter
/// ```
///
/// With defaults, delays are approximately: 800ms, 1.6s (before hitting max attempts).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Base delay for the first retry.
    base_delay: Duration,

    /// Maximum delay cap.
    max_delay: Duration,

    /// Multiplier applied each attempt (typically 2.0 for doubling).
    backoff_multiplier: f32,

    /// Upper bound of the random jitter added to each delay.
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_jitter: RETRY_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Maximum attempts including initial (clamped to >= 1)
    /// * `base_delay` - Base delay for first retry
    /// * `max_delay` - Maximum delay cap
    /// * `backoff_multiplier` - Multiplier for exponential increase
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
            max_jitter: RETRY_MAX_JITTER,
        }
    }

    /// Creates a doubling policy with the given attempt budget and base delay
    /// and no jitter. Add jitter with [`with_max_jitter`](Self::with_max_jitter),
    /// as the fetcher does with its request's `retry_jitter`.
    #[must_use]
    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_jitter: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Replaces the jitter bound; `Duration::ZERO` makes delays deterministic.
    #[must_use]
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether to retry a failed attempt.
    ///
    /// `attempt` is the attempt number that just failed (1-indexed).
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Formula: `min(base_delay * multiplier^(attempt-1), max_delay) + jitter`
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let multiplier = f64::from(self.backoff_multiplier);

        // attempt 1 = 2^0 = 1x base
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * multiplier.powf(exponent);

        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_ms as u64) + self.calculate_jitter()
    }

    /// Random jitter between 0 and `max_jitter`, so concurrent acquisitions
    /// that fail together do not retry in lockstep.
    #[allow(clippy::cast_possible_truncation)]
    fn calculate_jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(0..=max_ms))
    }
}

/// Classifies a fetch error into a failure type for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | Network | Transient |
/// | Timeout (header) | Transient |
/// | Timeout (overall deadline) | Permanent |
/// | HttpStatus (any) | Permanent |
/// | TooManyRedirects | Permanent |
/// | TooLarge | Permanent |
/// | InvalidUrl / InvalidHeader / PoolClosed | Permanent |
#[instrument]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::Network { .. }
        | FetchError::Timeout {
            kind: TimeoutKind::Header,
            ..
        } => FailureType::Transient,

        FetchError::Timeout {
            kind: TimeoutKind::Deadline,
            ..
        }
        | FetchError::HttpStatus { .. }
        | FetchError::TooManyRedirects { .. }
        | FetchError::TooLarge { .. }
        | FetchError::InvalidUrl { .. }
        | FetchError::InvalidHeader { .. }
        | FetchError::PoolClosed { .. } => FailureType::Permanent,
    }
}
