// ABOUTME: Entry point for the relaystore binary.
// ABOUTME: Initializes tracing, loads config, and restores every client store from its backend.

use relaystore_store::{RelayStoreConfig, StoreManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("relaystore=debug,relaystore_store=debug")
            }),
        )
        .init();

    tracing::info!("relaystore starting up");

    let config = RelayStoreConfig::from_env()?;
    tracing::info!(
        "using {:?} backend at {} with prefix {}",
        config.backend,
        config.home.display(),
        config.storage_prefix
    );

    let manager = StoreManager::from_config(&config)?;
    let report = manager.init_all().await;

    tracing::info!("proposals: {:?}", report.proposals);
    tracing::info!("sessions: {:?}", report.sessions);
    tracing::info!("pairings: {:?}", report.pairings);

    for topic in manager.sessions.keys().await {
        tracing::debug!("restored session {}", topic);
    }

    Ok(())
}
