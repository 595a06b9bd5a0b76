//! Reef log service entry point.
//!
//! See [`log_service::config`] for the environment variables it reads.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use log_service::clock::SystemClock;
use log_service::config::ServiceConfig;
use log_service::store::{MemoryReadingStore, PgReadingStore, ReadingStore};
use log_service::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("log_service=info".parse()?),
        )
        .json()
        .init();

    let cfg = ServiceConfig::load()?;

    let store: Arc<dyn ReadingStore> = match cfg.database_url.as_deref() {
        Some(url) => {
            let pg = PgReadingStore::connect(url, cfg.max_connections).await?;
            pg.migrate().await?;
            info!(max_connections = cfg.max_connections, "Using PgReadingStore");
            Arc::new(pg)
        }
        None => {
            info!("No REEF_DATABASE_URL; using MemoryReadingStore");
            Arc::new(MemoryReadingStore::new())
        }
    };

    let state = Arc::new(AppState::new(store, Arc::new(SystemClock)));
    let app = log_service::router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    info!(addr = %cfg.listen_addr, "log-service listening");

    axum::serve(listener, app).await?;

    Ok(())
}
