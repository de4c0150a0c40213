use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;

use switchboard_engine::{api, Dispatcher, EngineConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EngineConfig::from_env()?;
    config.warn_missing_credentials();
    log::info!(
        "Starting Switchboard (model {}, upstream timeout {}s)",
        config.model,
        config.upstream_timeout.as_secs()
    );

    let dispatcher = Arc::new(Dispatcher::from_config(&config)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let addr = config.addr;
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::start_server(addr, dispatcher, shutdown_rx).await {
            log::error!("API server crashed: {}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    log::info!("Received shutdown signal...");

    let _ = shutdown_tx.send(true);
    let _ = api_handle.await;

    log::info!("Switchboard shutdown complete.");
    Ok(())
}
