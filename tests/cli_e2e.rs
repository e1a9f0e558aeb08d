//! End-to-end CLI tests for the mediagrab binary.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use support::socket_guard::start_mock_server_or_skip;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn mediagrab() -> Command {
    let mut cmd = Command::cargo_bin("mediagrab").unwrap();
    for var in [
        "MEDIAGRAB_DOWNLOAD_TIMEOUT_MS",
        "MEDIAGRAB_HEADER_TIMEOUT_MS",
        "MEDIAGRAB_MAX_RETRIES",
        "MEDIAGRAB_RETRY_BASE_MS",
        "MEDIAGRAB_RETRY_JITTER_MS",
        "MEDIAGRAB_MAX_BYTES",
        "MEDIAGRAB_SCRAPER_ENDPOINT",
        "PINTEREST_COOKIES",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Runs the command off the async runtime so the mock server keeps serving.
async fn run(mut cmd: Command) -> assert_cmd::assert::Assert {
    tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap()
}

#[test]
fn test_binary_help_displays_usage() {
    mediagrab()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fetch the video or image behind a share link"));
}

#[test]
fn test_binary_version_displays_version() {
    mediagrab()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mediagrab"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    mediagrab()
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_text_without_link_exits_zero() {
    mediagrab()
        .args(["-q", "no", "link", "here"])
        .assert()
        .success();
}

#[test]
fn test_out_of_range_config_exits_two() {
    mediagrab()
        .args(["--max-retries", "50", "https://example.com/a.mp4"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--max-retries must be between 1 and 10"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_direct_link_written_to_output_file() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/clip.mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "video/mp4")
                .set_body_bytes(b"fake mp4 bytes".to_vec()),
        )
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.mp4");
    let mut cmd = mediagrab();
    cmd.args(["-q", "--no-ipv4-only", "--ytdlp-path", "/bin/false", "-o"])
        .arg(&output)
        .arg(format!("look: ({}/clip.mp4)", mock_server.uri()));

    run(cmd).await.success();
    assert_eq!(std::fs::read(&output).unwrap(), b"fake mp4 bytes");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_media_streamed_to_stdout() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(b"png!".to_vec()),
        )
        .mount(&mock_server)
        .await;

    let mut cmd = mediagrab();
    cmd.args(["-q", "--no-ipv4-only", "-o", "-"])
        .arg(format!("{}/img.png", mock_server.uri()));

    run(cmd).await.success().stdout(&b"png!"[..]);
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_failed_acquisition_exits_one() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut cmd = mediagrab();
    cmd.current_dir(dir.path())
        .args(["-q", "--no-ipv4-only", "--ytdlp-path", "/bin/false"])
        .arg(format!("{}/missing", mock_server.uri()));

    run(cmd)
        .await
        .code(1)
        .stderr(predicate::str::contains("Could not fetch media"));
    assert!(!dir.path().join("media.jpg").exists());
}

#[test]
fn test_exclusive_second_instance_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let lock = dir.path().join("grab.lock");
    let file = std::fs::File::create(&lock).unwrap();
    fs2::FileExt::lock_exclusive(&file).unwrap();

    mediagrab()
        .args(["--exclusive", "--lock-file"])
        .arg(&lock)
        .arg("https://example.com/a.mp4")
        .assert()
        .success()
        .stderr(predicate::str::contains("another instance is running"));
}
