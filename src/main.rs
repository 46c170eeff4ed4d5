// src/main.rs

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mod_sync::logging::init_logging;
use mod_sync::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

const BAR_SCALE: u64 = 1000;

/// Sync a local mods folder against the remote mod list.
#[derive(Debug, Parser)]
#[command(name = "mod-sync", version)]
struct Args {
    /// Installed mods directory (must already exist).
    #[arg(long)]
    mods_dir: Option<PathBuf>,

    /// URL of the JSON manifest.
    #[arg(long)]
    manifest_url: Option<String>,

    /// JSON config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pause after a failed download, in milliseconds.
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Stop the batch at the first failed download.
    #[arg(long)]
    stop_on_error: bool,

    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug)?;

    let mut config = match &args.config {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SyncConfig::default(),
    };
    if let Some(dir) = args.mods_dir {
        config.mods_dir = dir;
    }
    if let Some(url) = args.manifest_url {
        config.manifest_url = url;
    }
    if let Some(ms) = args.cooldown_ms {
        config.cooldown_ms = ms;
    }
    config.stop_on_error |= args.stop_on_error;
    if config.mods_dir.as_os_str().is_empty() {
        bail!("no mods directory given (use --mods-dir or the config file)");
    }

    let manager = Arc::new(SyncManager::from_config(config)?);
    let (handle, mut events) = manager.spawn_with_channel();

    let bar = ProgressBar::new(BAR_SCALE);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {percent:>3}%")?,
    );
    while let Some(event) = events.recv().await {
        match event {
            SyncEvent::Progress(fraction) => {
                bar.set_position((fraction.clamp(0.0, 1.0) * BAR_SCALE as f32) as u64)
            }
            SyncEvent::Status(status) => bar.println(status.to_string()),
        }
    }
    bar.finish_and_clear();

    let report = handle.await??;
    println!(
        "{} downloaded, {} deleted, {} failed, {} skipped ({} bytes)",
        report.downloaded(),
        report.deleted(),
        report.failed(),
        report.rejected(),
        report.downloaded_bytes
    );
    Ok(())
}
