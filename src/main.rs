//! AttrSync CLI - attribute-preserving directory and object-store sync

use clap::Parser;
use tracing_subscriber::EnvFilter;

use attrsync::config::{CliArgs, SyncConfig};
use attrsync::engine::SyncEngine;
use attrsync::error::Result;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config = SyncConfig::from_cli(&args)?;

    tracing::info!(
        source = %config.source,
        dest = %config.dest,
        workers = config.workers(),
        "starting sync"
    );

    let engine = SyncEngine::new(config);
    let summary = engine.execute()?;
    summary.print();

    if !summary.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
