//! Subprocess-based media extraction.
//!
//! When no direct media URL can be obtained, an external tool (yt-dlp) is run
//! with its output on stdout. The bytes are captured under the same cap as the
//! HTTP fetcher and, since the tool reports no MIME type, classified by their
//! magic bytes.

mod error;
mod sniff;
mod subprocess;

pub use error::ExtractError;
pub use sniff::{OCTET_STREAM, VIDEO_SIZE_THRESHOLD, sniff_content_type};
pub use subprocess::{
    DEFAULT_EXTRACT_TIMEOUT, DEFAULT_RATE_LIMIT, DEFAULT_STDERR_EXCERPT, ExtractOptions,
    ExtractorConfig, SubprocessExtractor, SubprocessResult, locate_program, tool_version,
};
