pub mod api;
pub mod config;
pub mod core_state;
pub mod dashboard;
pub mod db;
pub mod extraction;
pub mod identity;
pub mod labs;
pub mod models;
pub mod pipeline;
pub mod reports;
pub mod storage;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Load configuration, open state and serve the API until Ctrl-C.
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let app_config = config::AppConfig::from_env().context("Invalid configuration")?;
    if app_config.extraction.api_key.is_none() {
        tracing::warn!("ANTHROPIC_API_KEY is not set; PDF uploads will fail");
    }

    let core = core_state::CoreState::from_config(&app_config)
        .with_context(|| format!("Cannot open data directory {}", app_config.data_dir.display()))?;

    let mut server = api::server::start_server(Arc::new(core), app_config.addr)
        .await
        .map_err(anyhow::Error::msg)?;
    tracing::info!(addr = %server.addr(), "Listening");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    server.shutdown();
    server.stopped().await;
    Ok(())
}
