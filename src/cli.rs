//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use mediagrab_core::DEFAULT_MAX_RETRIES;

/// Fetch the video or image behind a share link.
///
/// Mediagrab finds the first link in its input, expands short links, and
/// tries the platform's strategies in order until one yields media.
#[derive(Parser, Debug)]
#[command(name = "mediagrab")]
#[command(author, version, about)]
pub struct Args {
    /// Link, or a message containing one (read from stdin when omitted)
    pub input: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Where to write the media (`-` for stdout; default media.mp4 or media.jpg)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Ask for title/artist/album/comment on stdin and write a JSON sidecar
    #[arg(long)]
    pub tags: bool,

    /// Refuse to run while another exclusive instance holds the lock
    #[arg(long)]
    pub exclusive: bool,

    /// Lock file used by --exclusive
    #[arg(long, env = "MEDIAGRAB_LOCK_FILE")]
    pub lock_file: Option<PathBuf>,

    /// Overall time budget per fetch attempt in milliseconds
    #[arg(long, env = "MEDIAGRAB_DOWNLOAD_TIMEOUT_MS", default_value_t = 90_000)]
    pub download_timeout_ms: u64,

    /// Time allowed for response headers in milliseconds
    #[arg(long, env = "MEDIAGRAB_HEADER_TIMEOUT_MS", default_value_t = 20_000)]
    pub header_timeout_ms: u64,

    /// Total attempts per fetch, first one included (1-10)
    #[arg(long, env = "MEDIAGRAB_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Base delay between attempts in milliseconds (doubled after each retry)
    #[arg(long, env = "MEDIAGRAB_RETRY_BASE_MS", default_value_t = 800)]
    pub retry_base_ms: u64,

    /// Upper bound on the random delay added to each retry, in milliseconds
    #[arg(long, env = "MEDIAGRAB_RETRY_JITTER_MS", default_value_t = 250)]
    pub retry_jitter_ms: u64,

    /// Largest accepted body in bytes
    #[arg(long, env = "MEDIAGRAB_MAX_BYTES")]
    pub max_bytes: Option<u64>,

    /// Redirects followed per fetch (0-20)
    #[arg(long, default_value_t = 5)]
    pub max_redirects: u32,

    /// Concurrent connections per pool (plain and TLS each)
    #[arg(long, default_value_t = 20)]
    pub max_connections: usize,

    /// Do not force IPv4 for outgoing connections
    #[arg(long)]
    pub no_ipv4_only: bool,

    /// Extraction tool binary (located automatically when unset)
    #[arg(long, env = "YTDLP_PATH")]
    pub ytdlp_path: Option<String>,

    /// ffmpeg location handed to the extraction tool
    #[arg(long, env = "FFMPEG_PATH")]
    pub ffmpeg_path: Option<String>,

    /// Seconds before the extraction tool is killed
    #[arg(long, default_value_t = 180)]
    pub extract_timeout_secs: u64,

    /// Single-line cookie string for Pinterest links
    #[arg(long, env = "PINTEREST_COOKIES", hide_env_values = true)]
    pub pinterest_cookies: Option<String>,

    /// JSON lookup service tried first for TikTok links
    #[arg(long, env = "MEDIAGRAB_SCRAPER_ENDPOINT")]
    pub scraper_endpoint: Option<String>,
}
