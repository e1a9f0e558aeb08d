//! Error types for the download module.
//!
//! Every variant carries the URL it concerns so a single message is enough to
//! tell which hop of an acquisition failed and why.

use std::fmt;

use thiserror::Error;

/// Which of the two per-attempt timers fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// Response headers did not arrive in time.
    Header,
    /// The attempt's overall deadline passed (redirects and body included).
    Deadline,
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header"),
            Self::Deadline => f.write_str("overall deadline"),
        }
    }
}

/// Errors that can occur while fetching a URL into memory.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, reset, TLS).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// One of the two attempt timers fired.
    #[error("{kind} timeout fetching {url}")]
    Timeout {
        /// The URL in flight when the timer fired.
        url: String,
        /// Which timer fired.
        kind: TimeoutKind,
    },

    /// Terminal non-2xx status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The redirect budget ran out.
    #[error("too many redirects (limit {limit}) fetching {url}")]
    TooManyRedirects {
        /// The URL whose redirect could not be followed.
        url: String,
        /// The initial redirect budget.
        limit: u32,
    },

    /// The body exceeded the byte cap; the connection was dropped.
    #[error("response from {url} too large (> {limit} bytes)")]
    TooLarge {
        /// The URL being streamed.
        url: String,
        /// The configured byte cap.
        limit: u64,
    },

    /// The provided URL (or a Location header) is malformed or not HTTP(S).
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
    },

    /// A header name or value override could not be encoded.
    #[error("invalid header {name} for {url}")]
    InvalidHeader {
        /// The URL the request targeted.
        url: String,
        /// The header name.
        name: String,
    },

    /// The connection pool limiter was closed.
    #[error("connection pool closed while fetching {url}")]
    PoolClosed {
        /// The URL waiting for a connection slot.
        url: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Maps a reqwest error, promoting its own timeouts to header timeouts.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url, TimeoutKind::Header)
        } else {
            Self::network(url, source)
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, kind: TimeoutKind) -> Self {
        Self::Timeout {
            url: url.into(),
            kind,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a redirect budget error.
    pub fn too_many_redirects(url: impl Into<String>, limit: u32) -> Self {
        Self::TooManyRedirects {
            url: url.into(),
            limit,
        }
    }

    /// Creates a byte cap error.
    pub fn too_large(url: impl Into<String>, limit: u64) -> Self {
        Self::TooLarge {
            url: url.into(),
            limit,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self::InvalidHeader {
            url: url.into(),
            name: name.into(),
        }
    }

    /// Returns the HTTP status for [`FetchError::HttpStatus`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_timeout_display_names_timer() {
        let header = FetchError::timeout("https://cdn.example.com/v.mp4", TimeoutKind::Header);
        assert!(header.to_string().contains("header timeout"));

        let deadline = FetchError::timeout("https://cdn.example.com/v.mp4", TimeoutKind::Deadline);
        let msg = deadline.to_string();
        assert!(msg.contains("overall deadline"), "got: {msg}");
        assert!(msg.contains("https://cdn.example.com/v.mp4"), "got: {msg}");
    }

    #[test]
    fn test_fetch_error_http_status_display() {
        let error = FetchError::http_status("https://example.com/missing.mp4", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert_eq!(error.status(), Some(404));
    }

    #[test]
    fn test_fetch_error_too_large_display() {
        let error = FetchError::too_large("https://example.com/huge.mp4", 1024);
        let msg = error.to_string();
        assert!(msg.contains("too large"), "got: {msg}");
        assert!(msg.contains("1024"), "got: {msg}");
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_fetch_error_redirects_display() {
        let error = FetchError::too_many_redirects("https://pin.it/abc", 5);
        assert!(error.to_string().contains("limit 5"));
    }
}
