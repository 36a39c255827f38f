//! Posture Sentinel - Main Entry Point

use anyhow::Context;
use sentinel::{init_logging, run, Settings};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(path.as_deref()).context("failed to load settings")?;

    init_logging(&settings.log)?;

    info!("=== Posture Sentinel v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Peripheral: {} @ {} baud", settings.link.device, settings.link.baud_rate);

    run(settings).await
}
