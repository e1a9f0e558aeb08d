//! Mediagrab Core Library
//!
//! This library acquires remote media (video or image) referenced by a
//! user-shared link, under strict resource bounds and tolerating unreliable
//! hosts, redirect chains and missing content types.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - Streaming HTTP fetcher with redirects, timeouts, retry and a byte cap
//! - [`extract`] - External extraction tool runner with magic-byte sniffing
//! - [`resolver`] - Ordered strategy chains turning share links into media
//! - [`conversation`] - Per-chat collection of optional metadata fields
//! - [`platform`] - Link extraction, short-link expansion and per-platform chains
//! - [`media`] - Video/photo delivery classification

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod conversation;
pub mod download;
pub mod extract;
pub mod media;
pub mod platform;
pub mod resolver;
#[cfg(test)]
pub mod test_support;
pub mod user_agent;

// Re-export commonly used types
pub use conversation::{
    CompletedForm, ConversationStepper, SessionStore, StepError, StepInput, StepState,
};
pub use download::{
    BoundedByteSink, DEFAULT_MAX_RETRIES, FailureType, FetchConfig, FetchError, FetchRequest,
    FetchResult, HttpClient, Overflow, RetryDecision, RetryPolicy, TimeoutKind, classify_error,
};
pub use extract::{
    ExtractError, ExtractOptions, ExtractorConfig, SubprocessExtractor, SubprocessResult,
    sniff_content_type,
};
pub use media::MediaKind;
pub use platform::{ChainSettings, Platform};
pub use resolver::{
    DirectStrategy, ExtractorStrategy, MediaResolver, ResolutionOutcome, ResolveError,
    ScraperApiStrategy, Strategy, extract_candidate,
};
