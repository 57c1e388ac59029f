use std::sync::Arc;

use backend::config::Config;
use backend::store::SqliteRepository;
use backend::uploads::UploadStore;
use backend::{app, AppState};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "backend=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    let repo = SqliteRepository::open(&config.database_path)?;
    let uploads = UploadStore::new(&config.upload_dir);
    uploads.ensure_dir().await?;

    let state = AppState::new(Arc::new(repo), uploads);
    let router = app(state, &config);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
