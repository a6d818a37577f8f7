use asset_pulse::{analysis, storage_utils::AsyncStorageManager};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Step 1: Load configuration (written with defaults on first run)
    let storage = AsyncStorageManager::new_relative("storage").await?;
    let config = storage.load_config().await?;
    info!(symbols = ?config.symbols, interval = %config.klines.interval, "config loaded");

    // Step 2: Fetch, analyze, comment, persist
    let output = match analysis::run_analysis_pipeline(&storage, &config).await {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, "analysis pipeline failed");
            return Err(e);
        }
    };

    // Step 3: Display Results
    asset_pulse::comfy_table::print_reports(&output);

    Ok(())
}
