//! CLI entry point for mediagrab.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info};

mod app;
mod cli;

use app::config::RunConfig;
use app::instance::{InstanceLock, default_lock_path};
use cli::Args;

/// Process outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Media acquired, or nothing to do.
    Success,
    /// Every strategy failed.
    Failure,
}

/// Exit status for configuration errors, matching clap's usage errors.
const CONFIG_ERROR_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr; stdout may carry media bytes.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(verbose = args.verbose, exclusive = args.exclusive, "CLI arguments parsed");

    let config = match RunConfig::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::from(CONFIG_ERROR_EXIT);
        }
    };

    let _lock = if args.exclusive {
        let path = args.lock_file.clone().unwrap_or_else(default_lock_path);
        match InstanceLock::try_acquire(&path) {
            Ok(Some(lock)) => {
                debug!(path = %lock.path().display(), "holding instance lock");
                Some(lock)
            }
            Ok(None) => {
                info!(path = %path.display(), "another instance is running; exiting");
                return ExitCode::SUCCESS;
            }
            Err(err) => {
                error!("{err:#}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    match app::runtime::run(&args, config).await {
        Ok(ProcessExit::Success) => ExitCode::SUCCESS,
        Ok(ProcessExit::Failure) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
