//! Segment Insights HTTP Server Binary
//!
//! Loads the configuration, preloads the configured datasets into the
//! in-memory repository and serves the REST API.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin segment-insights-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use segment_insights::config::AppConfig;
use segment_insights::db::{services, DatasetRepository, LocalRepository};
use segment_insights::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting Segment Insights HTTP Server");

    let config = match AppConfig::from_default_location() {
        Ok(config) => config,
        Err(e) => {
            warn!("{:#}; using defaults", e);
            AppConfig::default()
        }
    }
    .with_env_overrides();

    let repository: Arc<dyn DatasetRepository> = Arc::new(LocalRepository::new());
    for source in &config.datasets {
        match services::load_dataset_source(repository.as_ref(), source).await {
            Ok(dataset) => info!(
                "Preloaded dataset {} '{}' ({} rows)",
                dataset.dataset_id, dataset.name, dataset.row_count
            ),
            Err(e) => warn!("Skipping dataset '{}': {:#}", source.name, e),
        }
    }

    let app = create_router(AppState::new(repository));

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
