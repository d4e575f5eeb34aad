//! Horticulture operations server binary

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use hops_server::{
    config::{Config, StorageBackend},
    create_app, AppState, IntakeRepository, MemoryStore, PgStore,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hops_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Horticulture Operations Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!(
        "Reconciliation tolerance: {} kg",
        config.reconciliation.tolerance_kg
    );

    let store = connect_store(&config).await?;
    tracing::info!("Storage backend: {}", store.backend_tag());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let app = create_app(AppState::new(store, config));

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn IntakeRepository>> {
    match config.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .context("database configuration is required for postgres storage")?;

            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .min_connections(database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&database.url)
                .await?;
            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            Ok(Arc::new(PgStore::new(db_pool)))
        }
    }
}
