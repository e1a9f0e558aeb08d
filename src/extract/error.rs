//! Error types for the subprocess extractor.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running the external extraction tool.
///
/// None of these are retried at this layer; the resolver decides whether to
/// move on to another strategy.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The tool binary could not be found.
    #[error("extraction tool '{program}' not found\n  Suggestion: install yt-dlp or set YTDLP_PATH")]
    NotFound {
        /// Program that was spawned.
        program: String,
    },

    /// The tool could not be started for another reason.
    #[error("failed to start extraction tool '{program}': {source}")]
    Spawn {
        /// Program that was spawned.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The tool exited unsuccessfully.
    #[error("extraction tool failed (exit {}): {stderr}", display_code(.code))]
    Exit {
        /// Exit code, `None` when the process was killed by a signal.
        code: Option<i32>,
        /// First bytes of the tool's stderr.
        stderr: String,
    },

    /// The tool exited 0 but wrote nothing.
    #[error("extraction tool produced no output")]
    EmptyOutput,

    /// Output passed the byte cap; the process was killed.
    #[error("extraction output too large (> {limit} bytes)")]
    TooLarge {
        /// The configured byte cap.
        limit: u64,
    },

    /// The tool ran past its time limit and was killed.
    #[error("extraction tool timed out after {}s", .after.as_secs())]
    Timeout {
        /// The configured limit.
        after: Duration,
    },

    /// Reading the tool's output failed.
    #[error("I/O error reading extraction output: {source}")]
    Io {
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

#[allow(clippy::ref_option)]
fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl ExtractError {
    /// Maps a spawn failure, singling out a missing binary.
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        let program = program.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { program }
        } else {
            Self::Spawn { program, source }
        }
    }

    /// Creates an I/O error.
    pub fn io(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}
