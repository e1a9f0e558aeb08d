//! Direct strategy - the share URL is already the media URL.
//!
//! The [`DirectStrategy`] is the simplest strategy. It hands the URL to the
//! fetcher unchanged and succeeds when the body comes back within limits.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{ResolveError, Strategy};
use crate::download::{FetchResult, HttpClient};

/// A strategy that fetches the input URL as-is.
#[derive(Debug, Clone)]
pub struct DirectStrategy {
    client: Arc<HttpClient>,
    headers: BTreeMap<String, String>,
}

impl DirectStrategy {
    /// Creates a direct strategy on a shared client.
    #[must_use]
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            headers: BTreeMap::new(),
        }
    }

    /// Adds a header override sent with the fetch.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl Strategy for DirectStrategy {
    fn name(&self) -> &str {
        "direct"
    }

    #[tracing::instrument(skip(self), fields(strategy = "direct"))]
    async fn attempt(&self, url: &str) -> Result<FetchResult, ResolveError> {
        let mut request = self.client.request(url);
        for (name, value) in &self.headers {
            request = request.header(name.clone(), value.clone());
        }
        Ok(self.client.fetch(&request).await?)
    }
}
