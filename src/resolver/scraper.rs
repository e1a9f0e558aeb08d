//! Scraper-API strategy - ask a lookup service for the media URL, then fetch it.
//!
//! The service is called as `GET {endpoint}?url={share_url}` and answers with
//! JSON whose shape varies; [`extract_candidate`] picks the URL out of it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use super::candidate::extract_candidate;
use super::{ResolveError, Strategy};
use crate::download::{FetchError, FetchResult, HttpClient};

/// Cap on the lookup response body (1 MiB).
const LOOKUP_MAX_BYTES: u64 = 1024 * 1024;

/// Query parameter carrying the share URL.
const DEFAULT_QUERY_PARAM: &str = "url";

/// Resolves a share URL through a JSON lookup service.
#[derive(Debug, Clone)]
pub struct ScraperApiStrategy {
    client: Arc<HttpClient>,
    endpoint: String,
    query_param: String,
    media_headers: BTreeMap<String, String>,
}

impl ScraperApiStrategy {
    /// Creates a strategy for the lookup `endpoint`.
    #[must_use]
    pub fn new(client: Arc<HttpClient>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            query_param: DEFAULT_QUERY_PARAM.to_string(),
            media_headers: BTreeMap::new(),
        }
    }

    /// Overrides the query parameter name.
    #[must_use]
    pub fn query_param(mut self, name: impl Into<String>) -> Self {
        self.query_param = name.into();
        self
    }

    /// Adds a header sent when fetching the media candidate (not the lookup).
    #[must_use]
    pub fn media_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.media_headers.insert(name.into(), value.into());
        self
    }

    /// The lookup endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn lookup_url(&self, share_url: &str) -> Result<Url, ResolveError> {
        let mut lookup = Url::parse(&self.endpoint)
            .map_err(|_| ResolveError::Fetch(FetchError::invalid_url(self.endpoint.clone())))?;
        lookup
            .query_pairs_mut()
            .append_pair(&self.query_param, share_url);
        Ok(lookup)
    }

    /// Calls the lookup service and returns the candidate media URL.
    ///
    /// # Errors
    ///
    /// Fetch failures, a non-JSON body, or a body with no usable URL.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn lookup(&self, share_url: &str) -> Result<String, ResolveError> {
        let request = self
            .client
            .request(self.lookup_url(share_url)?.as_str())
            .header("Accept", "application/json")
            .max_bytes(Some(LOOKUP_MAX_BYTES));
        let response = self.client.fetch(&request).await?;

        let body: serde_json::Value = serde_json::from_slice(&response.bytes)
            .map_err(|e| ResolveError::invalid_response(self.name(), e.to_string()))?;
        let candidate = extract_candidate(&body).ok_or_else(|| ResolveError::no_candidate(self.name()))?;
        debug!(candidate = %candidate, "lookup returned media URL");
        Ok(candidate)
    }
}

#[async_trait]
impl Strategy for ScraperApiStrategy {
    fn name(&self) -> &str {
        "scraper-api"
    }

    async fn attempt(&self, url: &str) -> Result<FetchResult, ResolveError> {
        let candidate = self.lookup(url).await?;
        let mut request = self.client.request(candidate);
        for (name, value) in &self.media_headers {
            request = request.header(name.clone(), value.clone());
        }
        Ok(self.client.fetch(&request).await?)
    }
}
