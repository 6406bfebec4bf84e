use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use listing_bulk_api::config::{config, Environment};
use listing_bulk_api::database::{DatabaseManager, PgGenerationRepository, PgQuotaStore};
use listing_bulk_api::generation::LlmListingGenerator;
use listing_bulk_api::jobs::JobReaper;
use listing_bulk_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("listing_bulk_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config().clone();
    tracing::info!("Starting Listing Bulk API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set");
    }

    let generator = Arc::new(
        LlmListingGenerator::new(&config.generation).context("failed to build generation client")?,
    );
    if config.generation.api_key.is_none() {
        tracing::warn!("GENERATION_API_KEY is not set; generation requests will fail");
    }

    let state = if config.database.url.is_some() {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        DatabaseManager::ensure_schema(&pool)
            .await
            .context("failed to prepare database schema")?;

        AppState::new(
            config.clone(),
            Arc::new(PgQuotaStore::new(pool.clone())),
            Arc::new(PgGenerationRepository::new(pool.clone())),
            generator,
            Some(pool),
        )
    } else {
        if !matches!(config.environment, Environment::Development) {
            anyhow::bail!("DATABASE_URL must be set outside development");
        }
        tracing::warn!("DATABASE_URL not set; using in-memory stores (data is lost on restart)");
        AppState::in_memory(config.clone(), generator)
    };

    JobReaper::spawn(state.jobs.clone(), config.bulk.reaper_interval());

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listing Bulk API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
