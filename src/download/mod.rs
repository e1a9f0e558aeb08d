//! Resilient, bounded HTTP fetching into memory.
//!
//! This module provides the streaming fetcher every acquisition strategy
//! sits on. A fetch:
//!
//! - follows up to 5 redirects itself, resolving relative `Location` values
//! - bounds the wait for headers (20s) and the whole attempt (90s)
//! - retries transport failures with exponential backoff (3 attempts, 800ms base)
//! - never retries an HTTP status, an exceeded byte cap or an expired deadline
//! - caps concurrent connections per transport (plain, TLS)
//! - streams the body into a sink that refuses to grow past the byte cap
//!
//! # Example
//!
//! ```no_run
//! use mediagrab_core::download::{FetchConfig, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(FetchConfig::default())?;
//! let request = client
//!     .request("https://cdn.example.com/clip.mp4")
//!     .header("Referer", "https://www.tiktok.com/");
//! let media = client.fetch(&request).await?;
//! println!("fetched {} bytes from {}", media.len(), media.final_url);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod request;
mod retry;
mod sink;

pub use client::HttpClient;
pub use constants::{DELIVERY_MAX_BYTES, OVERALL_TIMEOUT};
pub use error::{FetchError, TimeoutKind};
pub use request::{FetchConfig, FetchRequest, FetchResult, resolve_location};
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
pub use sink::{BoundedByteSink, Overflow};
