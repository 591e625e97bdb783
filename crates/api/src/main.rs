//! Soil Health Service - Main Entry Point

use api::settings::AppConfig;
use api::{init_logging, run_server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("=== Soil Health Service v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.storage.database_url);

    run_server(config).await?;

    Ok(())
}
