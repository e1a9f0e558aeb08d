//! One acquisition run: link in, media file out.

use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use mediagrab_core::extract::tool_version;
use mediagrab_core::platform::{self, default_chain, expand_url, extract_first_url, failure_hint};
use mediagrab_core::{
    FetchResult, HttpClient, MediaKind, ResolutionOutcome, SubprocessExtractor,
};
use tracing::{debug, error, info, warn};

use crate::ProcessExit;
use crate::app::config::RunConfig;
use crate::app::tags;
use crate::cli::Args;

pub(crate) async fn run(args: &Args, config: RunConfig) -> Result<ProcessExit> {
    let Some(text) = read_input(&args.input)? else {
        info!("No input provided. Pass a link as an argument or pipe a message via stdin.");
        info!("Example: mediagrab https://pin.it/abc123");
        return Ok(ProcessExit::Success);
    };
    let Some(original) = extract_first_url(&text) else {
        info!("No link found in input");
        return Ok(ProcessExit::Success);
    };

    log_tool_versions(&config).await;

    let client = Arc::new(HttpClient::new(config.fetch.clone()).context("cannot build HTTP client")?);
    let extractor = Arc::new(SubprocessExtractor::new(config.extractor.clone()));

    let expanded = expand_url(&client, &original).await;
    let platform = platform::classify(&original, &expanded);
    info!(url = %original, %expanded, %platform, "acquiring");

    let resolver = default_chain(platform, &client, &extractor, &config.chain);
    let spinner = spinner(args.quiet, &platform.to_string());
    let outcome = resolver.resolve(&expanded).await;
    client.close();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let media = match outcome {
        ResolutionOutcome::Resolved { media, strategy } => {
            debug!(%strategy, "media acquired");
            media
        }
        ResolutionOutcome::Exhausted(err) => {
            error!(url = %original, error = %err, "acquisition failed");
            eprintln!("Could not fetch media for {original}: {err}");
            if let Some(hint) = failure_hint(&original, config.chain.pinterest_cookies.is_some()) {
                eprintln!("  Hint: {hint}");
            }
            return Ok(ProcessExit::Failure);
        }
    };

    let kind = MediaKind::of(&media);
    let destination = write_media(args.output.as_ref(), kind, &media)?;

    if args.tags {
        match &destination {
            Some(path) => {
                let stdin = io::stdin();
                if let Some(form) = tags::collect(&original, stdin.lock(), io::stderr())? {
                    let sidecar = tags::write_sidecar(path, &form, kind, &media.final_url)?;
                    info!(path = %sidecar.display(), "tags saved");
                }
            }
            None => warn!("--tags needs a file output; skipping tag collection"),
        }
    }

    Ok(ProcessExit::Success)
}

fn read_input(words: &[String]) -> Result<Option<String>> {
    if !words.is_empty() {
        return Ok(Some(words.join(" ")));
    }
    if io::stdin().is_terminal() {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("cannot read stdin")?;
    Ok((!buffer.trim().is_empty()).then_some(buffer))
}

async fn log_tool_versions(config: &RunConfig) {
    let program = &config.extractor.program;
    match tool_version(program, "--version").await {
        Some(version) => info!(%program, %version, "extraction tool found"),
        None => warn!(%program, "extraction tool not found; set YTDLP_PATH"),
    }
    let ffmpeg = config.extractor.ffmpeg_location.as_deref().unwrap_or("ffmpeg");
    match tool_version(ffmpeg, "-version").await {
        Some(version) => debug!(%ffmpeg, %version, "ffmpeg found"),
        None => debug!(%ffmpeg, "ffmpeg not found"),
    }
}

fn spinner(quiet: bool, platform: &str) -> Option<ProgressBar> {
    if quiet || !io::stderr().is_terminal() {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Fetching {platform} media..."));
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}

/// Writes the media to its destination. Returns the file path, or `None`
/// when written to stdout.
fn write_media(
    output: Option<&PathBuf>,
    kind: MediaKind,
    media: &FetchResult,
) -> Result<Option<PathBuf>> {
    if output.is_some_and(|p| p.as_os_str() == "-") {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&media.bytes)?;
        stdout.flush()?;
        return Ok(None);
    }

    let path = output
        .cloned()
        .unwrap_or_else(|| PathBuf::from(kind.file_name()));
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    fs::write(&path, &media.bytes).with_context(|| format!("cannot write {}", path.display()))?;
    info!(
        path = %path.display(),
        bytes = media.len(),
        content_type = %kind.delivery_content_type(&media.content_type),
        "media saved"
    );
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_media_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("clip.bin");
        let media = FetchResult::new(b"abc".to_vec(), "video/mp4", "https://x");

        let written = write_media(Some(&target), MediaKind::Video, &media)
            .unwrap()
            .unwrap();
        assert_eq!(written, target);
        assert_eq!(fs::read(&target).unwrap(), b"abc");
    }

    #[test]
    fn test_read_input_joins_words() {
        let words = vec!["olha".to_string(), "https://pin.it/x".to_string()];
        assert_eq!(
            read_input(&words).unwrap().as_deref(),
            Some("olha https://pin.it/x")
        );
    }
}
