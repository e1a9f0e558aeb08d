//! Error types for resolver operations.
//!
//! This module defines structured errors for media resolution, following the
//! What/Why/Fix pattern used across the project where a fix exists.

use thiserror::Error;

use crate::download::FetchError;
use crate::extract::ExtractError;

/// Errors that can occur while resolving a share URL into media.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The lookup response held no usable URL.
    #[error("no media URL found in lookup response from {source_name}")]
    NoCandidate {
        /// Service that answered.
        source_name: String,
    },

    /// The lookup response could not be understood.
    #[error("invalid lookup response from {source_name}: {reason}")]
    InvalidResponse {
        /// Service that answered.
        source_name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Fetching bytes failed.
    #[error("fetch failed: {0}")]
    Fetch(#[source] FetchError),

    /// The extraction tool failed.
    #[error("extraction failed: {0}")]
    Extract(#[source] ExtractError),

    /// The resolver was asked to run with no strategies.
    #[error("no strategy available for '{input}'\n  Suggestion: {suggestion}")]
    NoStrategy {
        /// The share URL.
        input: String,
        /// How to fix the issue.
        suggestion: String,
    },

    /// Every strategy failed; carries the last failure.
    #[error(
        "all {tried} strategies failed for '{input}'; last was {strategy}: {last}"
    )]
    Exhausted {
        /// The share URL.
        input: String,
        /// How many strategies ran.
        tried: usize,
        /// Name of the last strategy tried.
        strategy: String,
        /// The last strategy's error.
        #[source]
        last: Box<ResolveError>,
    },
}

impl ResolveError {
    /// Creates a `NoCandidate` error.
    #[must_use]
    pub fn no_candidate(source_name: &str) -> Self {
        Self::NoCandidate {
            source_name: source_name.to_string(),
        }
    }

    /// Creates an `InvalidResponse` error.
    #[must_use]
    pub fn invalid_response(source_name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `NoStrategy` error.
    #[must_use]
    pub fn no_strategy(input: &str) -> Self {
        Self::NoStrategy {
            input: input.to_string(),
            suggestion: "Register at least one strategy for this kind of link".to_string(),
        }
    }

    /// Creates an `Exhausted` error around the last strategy's failure.
    #[must_use]
    pub fn exhausted(input: &str, tried: usize, strategy: &str, last: Self) -> Self {
        Self::Exhausted {
            input: input.to_string(),
            tried,
            strategy: strategy.to_string(),
            last: Box::new(last),
        }
    }

    /// The innermost error, looking through `Exhausted`.
    #[must_use]
    pub fn last_failure(&self) -> &Self {
        match self {
            Self::Exhausted { last, .. } => last.last_failure(),
            other => other,
        }
    }
}

impl From<FetchError> for ResolveError {
    fn from(error: FetchError) -> Self {
        Self::Fetch(error)
    }
}

impl From<ExtractError> for ResolveError {
    fn from(error: ExtractError) -> Self {
        Self::Extract(error)
    }
}
