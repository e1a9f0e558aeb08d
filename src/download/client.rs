//! HTTP client wrapper for fetching media into memory.
//!
//! This module provides the `HttpClient` struct which streams response bodies
//! into a [`BoundedByteSink`] while enforcing the two attempt timers, the
//! redirect budget and the per-transport connection caps.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderName, HeaderValue, LOCATION};
use reqwest::{Client, Method, StatusCode};
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::REDIRECT_DRAIN_LIMIT;
use super::error::{FetchError, TimeoutKind};
use super::request::{FetchConfig, FetchRequest, FetchResult, resolve_location};
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use super::sink::BoundedByteSink;
use crate::user_agent;

/// HTTP client for fetching media with bounded memory.
///
/// Create once and share; the reqwest connection pool and the two transport
/// limiters live inside and are reused across every fetch.
///
/// # Example
///
/// ```no_run
/// use mediagrab_core::download::{FetchConfig, FetchRequest, HttpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(FetchConfig::default())?;
/// let media = client
///     .fetch(&FetchRequest::new("https://cdn.example.com/clip.mp4"))
///     .await?;
/// println!("{} bytes of {}", media.len(), media.content_type);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    plain: Semaphore,
    tls: Semaphore,
    config: FetchConfig,
}

/// A hop whose headers arrived with a 2xx status.
struct Landed<'a> {
    response: reqwest::Response,
    request: FetchRequest,
    _permit: SemaphorePermit<'a>,
}

impl HttpClient {
    /// Creates a client from fetch limits.
    ///
    /// Redirects are never followed by reqwest itself; the fetcher follows
    /// them so each hop counts against the request's own budget and deadline.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the TLS backend cannot be initialised.
    pub fn new(config: FetchConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true)
            .pool_max_idle_per_host(config.max_connections_per_pool)
            .user_agent(user_agent::BROWSER_USER_AGENT);
        if config.ipv4_only {
            builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }
        let client = builder.build()?;
        let permits = config.max_connections_per_pool.max(1);
        Ok(Self {
            client,
            plain: Semaphore::new(permits),
            tls: Semaphore::new(permits),
            config,
        })
    }

    /// The limits this client was built with.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Starts a request carrying this client's limits.
    #[must_use]
    pub fn request(&self, url: impl Into<String>) -> FetchRequest {
        FetchRequest::with_config(url, &self.config)
    }

    /// Closes both connection pools. Fetches waiting for a slot, and every
    /// later fetch, fail with [`FetchError::PoolClosed`]; hops already holding
    /// a slot finish normally.
    pub fn close(&self) {
        self.plain.close();
        self.tls.close();
        debug!("connection pools closed");
    }

    /// Returns true once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.plain.is_closed()
    }

    /// Free connection slots in the plain and TLS pools.
    #[must_use]
    pub fn available_connections(&self) -> (usize, usize) {
        (self.plain.available_permits(), self.tls.available_permits())
    }

    /// Fetches a URL into memory, following redirects and retrying transient
    /// failures with exponential backoff.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's [`FetchError`]. HTTP statuses, the byte cap,
    /// the redirect budget and the overall deadline end the fetch at once.
    #[instrument(skip(self, request), fields(url = %request.url))]
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        self.with_retries(request, || self.fetch_once(request)).await
    }

    /// Follows redirects and returns the URL that finally answered 2xx. The
    /// body is never read.
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch), minus the byte cap.
    #[instrument(skip(self, request), fields(url = %request.url))]
    pub async fn resolve_final_url(&self, request: &FetchRequest) -> Result<String, FetchError> {
        self.with_retries(request, || async {
            let deadline = attempt_deadline(request.overall_timeout);
            let landed = tokio::time::timeout_at(deadline, self.follow_redirects(request))
                .await
                .map_err(|_| FetchError::timeout(&request.url, TimeoutKind::Deadline))??;
            Ok(landed.request.url)
        })
        .await
    }

    async fn with_retries<T, F, Fut>(&self, request: &FetchRequest, op: F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let policy = RetryPolicy::exponential(request.max_retries, request.retry_base_delay)
            .with_max_jitter(request.retry_jitter);
        let mut attempt = 1;
        loop {
            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            match policy.should_retry(classify_error(&error), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        attempt,
                        max = policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "fetch attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(attempt, %reason, "giving up");
                    return Err(error);
                }
            }
        }
    }

    /// One attempt under its own overall deadline.
    async fn fetch_once(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        let deadline = attempt_deadline(request.overall_timeout);
        tokio::time::timeout_at(deadline, async {
            let landed = self.follow_redirects(request).await?;
            read_body(landed).await
        })
        .await
        .map_err(|_| FetchError::timeout(&request.url, TimeoutKind::Deadline))?
    }

    async fn follow_redirects(&self, request: &FetchRequest) -> Result<Landed<'_>, FetchError> {
        let limit = request.max_redirects;
        let mut hop = request.clone();
        loop {
            let started = Instant::now();
            let url = parse_http_url(&hop.url)?;
            let permit = self.acquire(&url).await?;
            let response = self.send(&hop, &url).await?;
            let status = response.status();

            if status.is_redirection()
                && let Some(location) = response.headers().get(LOCATION)
            {
                let location = location
                    .to_str()
                    .map_err(|_| FetchError::invalid_url(hop.url.clone()))?
                    .to_string();
                drain(response).await;
                drop(permit);

                let next = resolve_location(&url, &location)?;
                debug!(from = %hop.url, to = %next, status = status.as_u16(), "following redirect");
                let mut redirected = hop
                    .redirected_to(&next, started.elapsed())
                    .ok_or_else(|| FetchError::too_many_redirects(hop.url.clone(), limit))?;
                if status == StatusCode::SEE_OTHER {
                    redirected.method = Method::GET;
                }
                if redirected.overall_timeout.is_zero() {
                    return Err(FetchError::timeout(redirected.url, TimeoutKind::Deadline));
                }
                hop = redirected;
                continue;
            }

            if !status.is_success() {
                drain(response).await;
                return Err(FetchError::http_status(hop.url, status.as_u16()));
            }

            return Ok(Landed {
                response,
                request: hop,
                _permit: permit,
            });
        }
    }

    async fn acquire(&self, url: &Url) -> Result<SemaphorePermit<'_>, FetchError> {
        let pool = if url.scheme() == "https" {
            &self.tls
        } else {
            &self.plain
        };
        pool.acquire()
            .await
            .map_err(|_| FetchError::PoolClosed {
                url: url.to_string(),
            })
    }

    /// Sends one hop and waits for its headers.
    async fn send(&self, hop: &FetchRequest, url: &Url) -> Result<reqwest::Response, FetchError> {
        let mut builder = self.client.request(hop.method.clone(), url.clone());
        for (name, value) in user_agent::merged_headers(&hop.headers) {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| FetchError::invalid_header(hop.url.clone(), name.clone()))?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|_| FetchError::invalid_header(hop.url.clone(), name.clone()))?;
            builder = builder.header(header_name, header_value);
        }

        let (wait, kind) = header_wait(hop.header_timeout, hop.overall_timeout);
        match tokio::time::timeout(wait, builder.send()).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(error)) => Err(FetchError::from_reqwest(hop.url.clone(), error)),
            Err(_) => Err(FetchError::timeout(hop.url.clone(), kind)),
        }
    }
}

/// Far enough ahead to mean "no deadline" (about 30 years, as tokio uses).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline of an attempt starting now. Durations too large to add to the
/// clock are treated as unbounded.
fn attempt_deadline(overall_timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(overall_timeout.min(FAR_FUTURE))
        .unwrap_or(now)
}

/// The header wait never outlives what is left of the overall deadline.
fn header_wait(header_timeout: Duration, remaining: Duration) -> (Duration, TimeoutKind) {
    if header_timeout < remaining {
        (header_timeout, TimeoutKind::Header)
    } else {
        (remaining, TimeoutKind::Deadline)
    }
}

fn parse_http_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|_| FetchError::invalid_url(raw))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(FetchError::invalid_url(raw)),
    }
}

/// Streams the body of a landed hop into a bounded sink.
async fn read_body(landed: Landed<'_>) -> Result<FetchResult, FetchError> {
    let Landed {
        response, request, ..
    } = landed;
    let url = request.url;
    let limit = request.max_bytes;

    let announced = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    if let (Some(length), Some(max)) = (announced, limit)
        && length > max
    {
        debug!(length, max, "announced length exceeds cap");
        return Err(FetchError::too_large(url, max));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_default();

    let mut sink = BoundedByteSink::with_size_hint(limit, announced);
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::from_reqwest(url.clone(), e))?;
        if let Err(overflow) = sink.feed(&chunk) {
            debug!(limit = overflow.limit, attempted = overflow.attempted, "byte cap hit");
            return Err(FetchError::too_large(url, overflow.limit));
        }
    }

    debug!(bytes = sink.len(), %content_type, "body received");
    Ok(FetchResult::new(sink.finish(), content_type, url))
}

/// Reads and discards up to [`REDIRECT_DRAIN_LIMIT`] bytes so a small body
/// does not hold up connection reuse. Larger bodies are simply dropped.
async fn drain(response: reqwest::Response) {
    let mut stream = response.bytes_stream();
    let mut seen = 0usize;
    while seen < REDIRECT_DRAIN_LIMIT {
        match stream.next().await {
            Some(Ok(chunk)) => seen += chunk.len(),
            _ => break,
        }
    }
}
