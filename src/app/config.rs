//! Effective configuration: CLI arguments validated into library configs.

use std::time::Duration;

use anyhow::{Result, bail};
use mediagrab_core::download::DELIVERY_MAX_BYTES;
use mediagrab_core::extract::locate_program;
use mediagrab_core::{ChainSettings, ExtractorConfig, FetchConfig};

use crate::cli::Args;

const TIMEOUT_RANGE_MS: (u64, u64) = (1_000, 600_000);
const RETRY_RANGE: (u32, u32) = (1, 10);
const RETRY_BASE_RANGE_MS: (u64, u64) = (0, 30_000);
const RETRY_JITTER_RANGE_MS: (u64, u64) = (0, 5_000);
const REDIRECT_RANGE: (u32, u32) = (0, 20);
const CONNECTION_RANGE: (usize, usize) = (1, 256);
const EXTRACT_TIMEOUT_RANGE_SECS: (u64, u64) = (5, 3_600);

/// Everything a run needs, derived once from the arguments.
#[derive(Debug, Clone)]
pub(crate) struct RunConfig {
    pub(crate) fetch: FetchConfig,
    pub(crate) extractor: ExtractorConfig,
    pub(crate) chain: ChainSettings,
}

impl RunConfig {
    pub(crate) fn from_args(args: &Args) -> Result<Self> {
        ensure_range(
            "--download-timeout-ms",
            args.download_timeout_ms,
            TIMEOUT_RANGE_MS,
        )?;
        ensure_range(
            "--header-timeout-ms",
            args.header_timeout_ms,
            TIMEOUT_RANGE_MS,
        )?;
        if args.header_timeout_ms > args.download_timeout_ms {
            bail!(
                "--header-timeout-ms ({}) cannot exceed --download-timeout-ms ({})",
                args.header_timeout_ms,
                args.download_timeout_ms
            );
        }
        ensure_range("--max-retries", args.max_retries, RETRY_RANGE)?;
        ensure_range("--retry-base-ms", args.retry_base_ms, RETRY_BASE_RANGE_MS)?;
        ensure_range("--retry-jitter-ms", args.retry_jitter_ms, RETRY_JITTER_RANGE_MS)?;
        ensure_range("--max-redirects", args.max_redirects, REDIRECT_RANGE)?;
        ensure_range("--max-connections", args.max_connections, CONNECTION_RANGE)?;
        ensure_range(
            "--extract-timeout-secs",
            args.extract_timeout_secs,
            EXTRACT_TIMEOUT_RANGE_SECS,
        )?;
        let max_bytes = args.max_bytes.unwrap_or(DELIVERY_MAX_BYTES);
        if max_bytes == 0 {
            bail!("--max-bytes must be greater than 0");
        }
        if let Some(endpoint) = args.scraper_endpoint.as_deref()
            && url::Url::parse(endpoint).is_err()
        {
            bail!("--scraper-endpoint is not a valid URL: {endpoint}");
        }

        let fetch = FetchConfig {
            header_timeout: Duration::from_millis(args.header_timeout_ms),
            overall_timeout: Duration::from_millis(args.download_timeout_ms),
            max_redirects: args.max_redirects,
            max_retries: args.max_retries,
            retry_base_delay: Duration::from_millis(args.retry_base_ms),
            retry_jitter: Duration::from_millis(args.retry_jitter_ms),
            max_connections_per_pool: args.max_connections,
            max_bytes: Some(max_bytes),
            ipv4_only: !args.no_ipv4_only,
        };

        let extractor = ExtractorConfig {
            program: locate_program(args.ytdlp_path.as_deref()),
            ffmpeg_location: non_blank(args.ffmpeg_path.as_deref()),
            max_bytes: Some(max_bytes),
            timeout: Duration::from_secs(args.extract_timeout_secs),
            ..ExtractorConfig::default()
        };

        let chain = ChainSettings {
            scraper_endpoint: non_blank(args.scraper_endpoint.as_deref()),
            pinterest_cookies: non_blank(args.pinterest_cookies.as_deref()),
        };

        Ok(Self {
            fetch,
            extractor,
            chain,
        })
    }
}

fn ensure_range<T>(flag: &str, value: T, (min, max): (T, T)) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        bail!("{flag} must be between {min} and {max} (got {value})");
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
