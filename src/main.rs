//! Kit Stats Server - Binary Entry Point
//!
//! Reads configuration from the environment (and `.env`), opens the
//! timeframe stores and serves the HTTP API until Ctrl+C.

use std::sync::Arc;

use kit_stats::api::{create_router, AppState, JwtAuth};
use kit_stats::{IngestEngine, ServerConfig, StatRegistry, StoreBackend, TimeframeStores};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env()?;
    let registry = Arc::new(StatRegistry::standard()?);
    log::info!(
        "Loaded {} stat columns ({} events)",
        registry.columns().len(),
        registry.legal_events().count()
    );

    let stores = match &config.store {
        StoreBackend::Sqlite(path) => {
            log::info!("Using SQLite store at {}", path.display());
            TimeframeStores::sqlite(path, registry.clone())?
        }
        StoreBackend::Memory => {
            log::warn!("Using in-memory store, stats are lost on restart");
            TimeframeStores::in_memory(registry.clone())
        }
    };

    if config.reset_secret.is_none() {
        log::info!("STATS_RESET_SECRET not set, reset endpoint disabled");
    }

    let engine = IngestEngine::new(registry, stores, config.limits);
    let state = Arc::new(AppState::new(
        engine,
        JwtAuth::new(&config.jwt_secret),
        config.reset_secret.clone(),
    ));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    log::info!("Stats server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Stats server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
