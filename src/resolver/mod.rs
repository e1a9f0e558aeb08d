//! Multi-strategy resolution of share URLs into media bytes.
//!
//! A share URL is rarely the media itself. This module turns one into bytes
//! by running an ordered chain of strategies until one succeeds.
//!
//! # Architecture
//!
//! - [`Strategy`] - Async trait that individual strategies implement
//! - [`MediaResolver`] - Ordered chain with first-success resolution loop
//! - [`ResolutionOutcome`] - `Resolved` media or `Exhausted` with the last error
//! - [`DirectStrategy`] - Fetch the URL as-is
//! - [`ScraperApiStrategy`] - Ask a JSON lookup service, then fetch its answer
//! - [`ExtractorStrategy`] - Run the external extraction tool
//! - [`extract_candidate`] - Ordered URL picking over lookup responses
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mediagrab_core::download::{FetchConfig, HttpClient};
//! use mediagrab_core::resolver::{DirectStrategy, MediaResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(HttpClient::new(FetchConfig::default())?);
//! let resolver = MediaResolver::new().with(Box::new(DirectStrategy::new(client)));
//!
//! let media = resolver
//!     .resolve("https://cdn.example.com/clip.mp4")
//!     .await
//!     .into_result()?;
//! println!("{} bytes", media.len());
//! # Ok(())
//! # }
//! ```

mod candidate;
mod direct;
mod error;
mod extractor;
mod registry;
mod scraper;

pub use candidate::{CANDIDATE_FIELDS, PREFERRED_VARIANTS, extract_candidate, unwrap_result};
pub use direct::DirectStrategy;
pub use error::ResolveError;
pub use extractor::ExtractorStrategy;
pub use registry::MediaResolver;
pub use scraper::ScraperApiStrategy;

use async_trait::async_trait;

use crate::download::FetchResult;

/// One way of turning a share URL into media bytes.
///
/// Implementations must be thread-safe (`Send + Sync`) so a resolver can be
/// shared across concurrent acquisitions.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Short name used in logs and failure messages.
    fn name(&self) -> &str;

    /// Attempts to produce media for `url`.
    ///
    /// # Errors
    ///
    /// Any failure; the resolver logs it and moves to the next strategy.
    async fn attempt(&self, url: &str) -> Result<FetchResult, ResolveError>;
}

/// Result of running a strategy chain.
#[derive(Debug)]
pub enum ResolutionOutcome {
    /// A strategy produced media.
    Resolved {
        /// The media, owned by the caller from here on.
        media: FetchResult,
        /// Name of the strategy that produced it.
        strategy: String,
    },
    /// Every strategy failed. Carries [`ResolveError::Exhausted`] (or
    /// [`ResolveError::NoStrategy`] for an empty chain).
    Exhausted(ResolveError),
}

impl ResolutionOutcome {
    /// Returns true for `Resolved`.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// Converts into a `Result`, dropping the strategy name.
    ///
    /// # Errors
    ///
    /// The exhaustion error.
    pub fn into_result(self) -> Result<FetchResult, ResolveError> {
        match self {
            Self::Resolved { media, .. } => Ok(media),
            Self::Exhausted(error) => Err(error),
        }
    }
}
