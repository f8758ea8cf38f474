//! CDSS Rule Service - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // optional config file path as the only argument
    let config_path = std::env::args().nth(1);
    let settings = Settings::load(config_path.as_deref()).context("failed to load configuration")?;

    init_logging(&settings.logging)?;

    info!("=== CDSS Rule Service v{} ===", env!("CARGO_PKG_VERSION"));

    run_server(settings).await?;

    Ok(())
}
