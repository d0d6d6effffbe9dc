// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use obs_maven::packages::RpmCpioBackend;
use obs_maven::repository::{RepositoryClient, RetryPolicy};
use obs_maven::{Config, LogEvents, SyncRunner, SyncSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(name = "obs-to-maven")]
#[command(author, version, about = "Mirror jars from OBS RPM repositories into a local Maven repository", long_about = None)]
struct Cli {
    /// YAML configuration listing repositories and artifacts
    config: PathBuf,

    /// Root of the Maven repository to populate
    out: PathBuf,

    /// Keep reduced package indexes in this directory between runs
    #[arg(short, long)]
    cache: Option<PathBuf>,

    /// Only process this artifact (repeatable)
    #[arg(short, long = "artifact", value_name = "NAME")]
    artifacts: Vec<String>,

    /// Read group and version from the POM files in the packages
    #[arg(short, long)]
    pom: bool,

    /// Show debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load(&cli.config)?;
    debug!(
        "{} repositories, {} artifacts configured",
        config.repositories.len(),
        config.artifacts.len()
    );

    // Removed on drop, whether the run succeeded or not
    let work_dir = tempfile::Builder::new()
        .prefix("obsmvn-")
        .tempdir()
        .context("Failed to create work directory")?;

    let settings = SyncSettings {
        out: cli.out,
        cache_dir: cli.cache,
        work_dir: work_dir.path().to_path_buf(),
        parse_pom: cli.pom,
        retry: RetryPolicy::default(),
    };

    let transport = Arc::new(RepositoryClient::new()?);
    let mut runner = SyncRunner::from_config(&config, transport, Arc::new(RpmCpioBackend), settings);
    let summary = runner.run(&config.artifacts, &cli.artifacts, &LogEvents);

    drop(work_dir);
    if !summary.is_success() {
        std::process::exit(summary.exit_code());
    }
    Ok(())
}
