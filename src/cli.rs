//! Minimal CLI: one invocation runs exactly one check cycle.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use crate::config::WatcherConfig;
use crate::watcher::Watcher;

#[derive(Parser, Debug)]
#[command(
    name = "registry-watcher",
    version,
    about = "Polls a service registry and mails a diff report when it changes"
)]
pub struct Cli {
    /// Optional JSON config file; defaults plus RW_* env otherwise
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = WatcherConfig::load(cli.config.as_deref())?;

    info!(
        "checking registry at {} (snapshots in {})",
        cfg.registry_address(),
        cfg.local_path
    );

    let watcher = Watcher::from_config(&cfg)
        .with_context(|| format!("open snapshot store at {}", cfg.local_path))?;
    watcher.check().context("registry check failed")?;
    Ok(())
}
