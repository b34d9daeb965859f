//! EPR submission status service - main entry point

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use epr_common::logging::{init_logging, LogConfig};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use epr_server::{
    api,
    config::{Config, StorageBackend},
    repository::{MemoryStore, PgStore, SharedStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("epr-server")
        .filter_directives("epr_server=debug,tower_http=debug,sqlx=info")
        .build();
    let log_config = log_config.merge_env()?;
    init_logging(&log_config)?;

    info!("Starting EPR submission status service");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let store = connect(&config).await?;
    api::serve(config, store).await
}

async fn connect(config: &Config) -> Result<SharedStore> {
    match config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        },
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
                .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
                .connect(&config.database.url)
                .await?;
            info!("Database connection pool established");

            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
            info!("Database migrations completed");

            Ok(Arc::new(PgStore::new(pool)))
        },
    }
}
