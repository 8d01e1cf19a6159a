use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod config;
mod error;

use cli::Cli;
use crate::core::Engine;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting callmap v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config()?;
    if let Some(path) = &cli.save_config {
        config.save(path)?;
        info!("Configuration written to {}", path.display());
    }
    let engine = Engine::new(config);

    // Ctrl-C stops dispatching new files; what already ran is still reported
    let abort = engine.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing files in flight");
            abort.store(true, Ordering::SeqCst);
        }
    });

    cli.execute(engine).await
}
