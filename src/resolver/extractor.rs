//! Extractor strategy - run the external tool on the share URL.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ResolveError, Strategy};
use crate::download::FetchResult;
use crate::extract::{ExtractOptions, SubprocessExtractor};

/// A strategy that delegates to the [`SubprocessExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractorStrategy {
    extractor: Arc<SubprocessExtractor>,
    options: ExtractOptions,
}

impl ExtractorStrategy {
    /// Creates the strategy with per-platform options.
    #[must_use]
    pub fn new(extractor: Arc<SubprocessExtractor>, options: ExtractOptions) -> Self {
        Self { extractor, options }
    }
}

#[async_trait]
impl Strategy for ExtractorStrategy {
    fn name(&self) -> &str {
        "extractor"
    }

    async fn attempt(&self, url: &str) -> Result<FetchResult, ResolveError> {
        Ok(self.extractor.extract(url, &self.options).await?)
    }
}
