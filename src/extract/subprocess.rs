//! Runs the external extraction tool and captures its output in memory.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, instrument, warn};

use super::error::ExtractError;
use super::sniff::sniff_content_type;
use crate::download::{BoundedByteSink, DELIVERY_MAX_BYTES, FetchResult};
use crate::user_agent;

/// Default limit on one tool run.
pub const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(180);

/// Default number of stderr bytes kept for diagnostics.
pub const DEFAULT_STDERR_EXCERPT: usize = 800;

/// Default download rate ceiling handed to the tool.
pub const DEFAULT_RATE_LIMIT: &str = "5M";

/// Places searched for the tool when no explicit path is configured.
const PROGRAM_CANDIDATES: [&str; 3] = ["/usr/local/bin/yt-dlp", "/usr/bin/yt-dlp", "yt-dlp"];

const READ_CHUNK: usize = 64 * 1024;

/// Process-level settings for the extraction tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Program to spawn.
    pub program: String,
    /// Arguments placed before the generated ones (e.g. `-m yt_dlp`).
    pub program_args: Vec<String>,
    /// Passed as `--ffmpeg-location` when set.
    pub ffmpeg_location: Option<String>,
    /// Passed as `--limit-rate`.
    pub rate_limit: String,
    /// Hard cap on captured stdout.
    pub max_bytes: Option<u64>,
    /// Stderr bytes kept for error messages.
    pub stderr_excerpt: usize,
    /// Kill the tool after this long.
    pub timeout: Duration,
    /// Hosts (and their subdomains) for which certificate checks are relaxed.
    pub insecure_hosts: Vec<String>,
    /// Passed as `--user-agent`.
    pub user_agent: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            program_args: Vec::new(),
            ffmpeg_location: None,
            rate_limit: DEFAULT_RATE_LIMIT.to_string(),
            max_bytes: Some(DELIVERY_MAX_BYTES),
            stderr_excerpt: DEFAULT_STDERR_EXCERPT,
            timeout: DEFAULT_EXTRACT_TIMEOUT,
            insecure_hosts: vec!["pinterest.com".to_string(), "pinimg.com".to_string()],
            user_agent: user_agent::BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// Per-call headers and cookies, usually chosen by platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Referer header; the baseline referer when unset.
    pub referer: Option<String>,
    /// Single-line cookie string sent as a `Cookie` header.
    pub cookies: Option<String>,
    /// Additional `Name: value` headers.
    pub headers: Vec<(String, String)>,
}

impl ExtractOptions {
    /// Options with a platform referer.
    #[must_use]
    pub fn with_referer(referer: impl Into<String>) -> Self {
        Self {
            referer: Some(referer.into()),
            ..Self::default()
        }
    }

    /// Adds a cookie line; blank lines are ignored.
    #[must_use]
    pub fn cookies(mut self, cookies: Option<&str>) -> Self {
        self.cookies = cookies
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToString::to_string);
        self
    }
}

/// Outcome of one tool run.
#[derive(Debug)]
pub struct SubprocessResult {
    /// Exit code, `None` when killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout, never above the byte cap.
    pub stdout: Vec<u8>,
    /// Leading stderr bytes, lossily decoded.
    pub stderr: String,
}

/// Invokes the extraction tool with output on stdout and classifies the bytes.
///
/// # Example
///
/// ```no_run
/// use mediagrab_core::extract::{ExtractOptions, ExtractorConfig, SubprocessExtractor};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = SubprocessExtractor::new(ExtractorConfig::default());
/// let media = extractor
///     .extract(
///         "https://www.youtube.com/shorts/abc",
///         &ExtractOptions::with_referer("https://www.youtube.com/"),
///     )
///     .await?;
/// println!("{} bytes, {}", media.len(), media.content_type);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SubprocessExtractor {
    config: ExtractorConfig,
}

impl SubprocessExtractor {
    /// Creates an extractor.
    #[must_use]
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Runs the tool for `url` and returns the captured media.
    ///
    /// The content type is sniffed from the bytes; `final_url` is `url`.
    ///
    /// # Errors
    ///
    /// Non-zero exit, empty output, byte cap overflow, timeout and spawn
    /// failures are all returned as [`ExtractError`]. Nothing is retried.
    #[instrument(skip(self, options), fields(program = %self.config.program))]
    pub async fn extract(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<FetchResult, ExtractError> {
        let result = self.run(&self.build_args(url, options)).await?;

        if result.exit_code != Some(0) {
            warn!(code = ?result.exit_code, stderr = %result.stderr, "extraction tool failed");
            return Err(ExtractError::Exit {
                code: result.exit_code,
                stderr: result.stderr,
            });
        }
        if result.stdout.is_empty() {
            return Err(ExtractError::EmptyOutput);
        }

        let content_type = sniff_content_type(&result.stdout);
        info!(bytes = result.stdout.len(), content_type, "extraction complete");
        Ok(FetchResult::new(result.stdout, content_type, url))
    }

    /// Generated arguments for one URL. The URL is always last.
    #[must_use]
    pub fn build_args(&self, url: &str, options: &ExtractOptions) -> Vec<String> {
        let mut args: Vec<String> = [
            "--ignore-config",
            "-f",
            "best",
            "--recode-video",
            "mp4",
            "-o",
            "-",
            "--limit-rate",
            self.config.rate_limit.as_str(),
            "--no-warnings",
            "--no-mtime",
            "--no-progress",
            "--quiet",
            "--concurrent-fragments",
            "1",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        if let Some(ffmpeg) = &self.config.ffmpeg_location {
            args.extend(["--ffmpeg-location".to_string(), ffmpeg.clone()]);
        }
        if self.relaxes_certificates(url) {
            args.push("--no-check-certificate".to_string());
        }

        let referer = options
            .referer
            .as_deref()
            .unwrap_or(user_agent::DEFAULT_REFERER);
        args.extend([
            "--user-agent".to_string(),
            self.config.user_agent.clone(),
            "--add-header".to_string(),
            format!("Accept-Language: {}", user_agent::ACCEPT_LANGUAGE),
            "--add-header".to_string(),
            format!("Referer: {referer}"),
            "--geo-bypass".to_string(),
        ]);
        for (name, value) in &options.headers {
            args.extend(["--add-header".to_string(), format!("{name}: {value}")]);
        }
        if let Some(cookies) = &options.cookies {
            args.extend(["--add-header".to_string(), format!("Cookie: {cookies}")]);
        }

        args.push(url.to_string());
        args
    }

    fn relaxes_certificates(&self, url: &str) -> bool {
        let Some(host) = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        else {
            return false;
        };
        self.config.insecure_hosts.iter().any(|allowed| {
            host == *allowed || host.ends_with(&format!(".{allowed}"))
        })
    }

    /// Spawns the tool with `args` after the configured leading arguments and
    /// collects its output.
    ///
    /// Stdout is read into a bounded sink; crossing the cap kills the process.
    /// Stderr is drained concurrently and only its first bytes are kept, so a
    /// chatty tool can never block on a full pipe.
    ///
    /// # Errors
    ///
    /// Spawn failure, I/O failure, byte cap overflow or timeout. A non-zero
    /// exit is not an error here; it is reported in the result.
    pub async fn run(&self, args: &[String]) -> Result<SubprocessResult, ExtractError> {
        let program = &self.config.program;
        debug!(%program, args = args.len(), "spawning extraction tool");

        let mut child = Command::new(program)
            .args(&self.config.program_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExtractError::spawn(program.clone(), e))?;

        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(read_excerpt(stderr, self.config.stderr_excerpt)));

        let outcome =
            tokio::time::timeout(self.config.timeout, self.collect_stdout(&mut child)).await;

        let (status, stdout) = match outcome {
            Ok(Ok(collected)) => collected,
            Ok(Err(error)) => {
                abort(stderr_task);
                return Err(error);
            }
            Err(_) => {
                warn!(timeout_secs = self.config.timeout.as_secs(), "extraction tool timed out");
                kill(&mut child).await;
                abort(stderr_task);
                return Err(ExtractError::Timeout {
                    after: self.config.timeout,
                });
            }
        };

        let stderr = match stderr_task {
            // Grandchildren may keep the pipe open after the tool exits.
            Some(task) => tokio::time::timeout(Duration::from_secs(2), task)
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default(),
            None => String::new(),
        };

        Ok(SubprocessResult {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }

    async fn collect_stdout(&self, child: &mut Child) -> Result<(ExitStatus, Vec<u8>), ExtractError> {
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractError::io(std::io::Error::other("stdout was not captured")))?;

        let mut sink = BoundedByteSink::new(self.config.max_bytes);
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let read = stdout.read(&mut buf).await.map_err(ExtractError::io)?;
            if read == 0 {
                break;
            }
            if let Err(overflow) = sink.feed(&buf[..read]) {
                warn!(limit = overflow.limit, "extraction output over cap, killing tool");
                kill(child).await;
                return Err(ExtractError::TooLarge {
                    limit: overflow.limit,
                });
            }
        }

        let status = child.wait().await.map_err(ExtractError::io)?;
        Ok((status, sink.finish()))
    }
}

async fn kill(child: &mut Child) {
    if let Err(error) = child.start_kill() {
        debug!(%error, "extraction tool already gone");
    }
    let _ = child.wait().await;
}

fn abort(task: Option<tokio::task::JoinHandle<String>>) {
    if let Some(task) = task {
        task.abort();
    }
}

/// Reads a stream to its end, keeping the first `keep` bytes.
async fn read_excerpt<R: AsyncRead + Unpin>(mut reader: R, keep: usize) -> String {
    let mut kept = Vec::with_capacity(keep.min(READ_CHUNK));
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(read) => {
                let room = keep.saturating_sub(kept.len());
                kept.extend_from_slice(&buf[..read.min(room)]);
            }
        }
    }
    String::from_utf8_lossy(&kept).trim().to_string()
}

/// Picks the tool binary: `explicit` first, then the usual install locations,
/// then a bare `yt-dlp` left to `PATH` lookup. Paths are only accepted if they
/// exist; bare names always are.
#[must_use]
pub fn locate_program(explicit: Option<&str>) -> String {
    explicit
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .into_iter()
        .chain(PROGRAM_CANDIDATES)
        .find(|candidate| !candidate.contains('/') || Path::new(candidate).exists())
        .unwrap_or("yt-dlp")
        .to_string()
}

/// Runs `program flag` and returns the first line of its output, for startup logs.
pub async fn tool_version(program: &str, flag: &str) -> Option<String> {
    let output = tokio::time::timeout(
        Duration::from_secs(10),
        Command::new(program)
            .arg(flag)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .ok()?
    .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}
