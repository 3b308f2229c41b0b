use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{Level, info};

use server::config::AppConfig;
use server::database::init_db;
use server::records::{AssetRecords, SeaOrmAssetRecords};
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    let level: Level = config
        .log
        .level
        .parse()
        .with_context(|| format!("Invalid log level '{}'", config.log.level))?;
    tracing_subscriber::fmt().with_max_level(level).init();

    let db = init_db(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Database schema synchronized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState::open(config, |class| -> Arc<dyn AssetRecords> {
        Arc::new(SeaOrmAssetRecords::new(db.clone(), class))
    })
    .await
    .context("Failed to open blob storage")?;

    let app = server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
