use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Env, Target};

use crate::api::{RacingClient, DEFAULT_ENDPOINT};
use crate::category::{CategoryFilter, RaceCategory};

/// Command-line and environment settings shared by both binaries.
#[derive(Debug, Clone, Parser)]
#[command(version, about = "Next-to-go races with live countdowns")]
pub struct Config {
    /// Race feed URL
    #[arg(long, env = "RACE_TRACKER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Seconds between automatic refreshes
    #[arg(
        long,
        env = "RACE_TRACKER_INTERVAL",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_secs: u64,

    /// Request timeout in seconds
    #[arg(
        long,
        env = "RACE_TRACKER_TIMEOUT",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Categories shown at startup (repeatable); all when omitted
    #[arg(long = "category", value_enum)]
    pub categories: Vec<RaceCategory>,

    /// Append log output to this file
    #[arg(long, env = "RACE_TRACKER_LOG")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_filter(&self) -> CategoryFilter {
        if self.categories.is_empty() {
            CategoryFilter::all_known()
        } else {
            CategoryFilter::from_categories(self.categories.iter().copied())
        }
    }

    pub fn client(&self) -> RacingClient {
        RacingClient::with_endpoint(self.endpoint.clone(), self.timeout())
    }
}

/// Set up `env_logger`, filtered by `RUST_LOG` (default `info`).
///
/// With a log file, output is appended there. Without one, output goes to
/// stderr only when `stderr_fallback` is set; otherwise logging stays off so
/// a full-screen terminal UI is not drawn over.
pub fn init_logging(log_file: Option<&Path>, stderr_fallback: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None if stderr_fallback => {
            builder.target(Target::Stderr);
        }
        None => return Ok(()),
    }

    builder.try_init().context("failed to initialise logger")?;
    Ok(())
}
