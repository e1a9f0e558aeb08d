//! Ordered strategy chain with first-success resolution loop.
//!
//! The [`MediaResolver`] holds the strategies for one kind of link and runs
//! them in registration order until one returns media.

use tracing::{debug, info, warn};

use super::{ResolutionOutcome, ResolveError, Strategy};

/// An ordered collection of strategies.
///
/// Strategies are tried in registration order. Each failure is logged and the
/// next strategy runs; when every strategy has failed the outcome carries the
/// last error.
pub struct MediaResolver {
    strategies: Vec<Box<dyn Strategy>>,
}

impl MediaResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy to the chain.
    #[tracing::instrument(skip(self, strategy), fields(strategy_name))]
    pub fn register(&mut self, strategy: Box<dyn Strategy>) {
        tracing::Span::current().record("strategy_name", strategy.name());
        debug!(name = strategy.name(), position = self.strategies.len(), "Registering strategy");
        self.strategies.push(strategy);
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, strategy: Box<dyn Strategy>) -> Self {
        self.register(strategy);
        self
    }

    /// Returns the number of registered strategies.
    #[must_use]
    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Returns true if no strategies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy names in the order they will run.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolves a share URL to media.
    ///
    /// 1. Tries each strategy in order
    /// 2. On success → returns `Resolved` with the strategy's name
    /// 3. On failure → logs and tries the next strategy
    /// 4. Returns `Exhausted` with the last strategy's error if none succeeds
    ///
    /// With no strategies registered the outcome is `Exhausted(NoStrategy)`.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, url: &str) -> ResolutionOutcome {
        let mut last: Option<(&str, ResolveError)> = None;

        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "Trying strategy");
            match strategy.attempt(url).await {
                Ok(media) => {
                    info!(
                        strategy = strategy.name(),
                        bytes = media.len(),
                        content_type = %media.content_type,
                        "Resolution successful"
                    );
                    return ResolutionOutcome::Resolved {
                        media,
                        strategy: strategy.name().to_string(),
                    };
                }
                Err(error) => {
                    warn!(
                        strategy = strategy.name(),
                        error = %error,
                        "Strategy failed, trying next"
                    );
                    last = Some((strategy.name(), error));
                }
            }
        }

        let error = match last {
            Some((strategy, error)) => {
                ResolveError::exhausted(url, self.strategies.len(), strategy, error)
            }
            None => ResolveError::no_strategy(url),
        };
        ResolutionOutcome::Exhausted(error)
    }
}

impl std::fmt::Debug for MediaResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaResolver")
            .field("strategy_count", &self.strategies.len())
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

impl Default for MediaResolver {
    fn default() -> Self {
        Self::new()
    }
}
