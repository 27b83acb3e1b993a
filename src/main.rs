use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cleanwhale_analytics::cache::Cache;
use cleanwhale_analytics::config::{self, AppConfig};
use cleanwhale_analytics::database::DatabaseManager;
use cleanwhale_analytics::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config().clone();
    init_tracing(&config);
    tracing::info!("Starting CleanWhale Analytics in {:?} mode", config.environment);

    let report = config.validate();
    for warning in &report.warnings {
        tracing::warn!("{warning}");
    }
    for error in &report.errors {
        tracing::error!("{error}");
    }
    if config.is_production() {
        report.ensure_valid()?;
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    if config.database.run_migrations {
        DatabaseManager::run_migrations(&pool).await.context("failed to run migrations")?;
    }

    let cache = Cache::from_config(&config).await;
    let port = config.server.port;
    let app = build_router(AppState::new(config, pool, cache));

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("Listening on http://{bind_addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let default_filter = if config.is_production() {
        "info"
    } else {
        "cleanwhale_analytics=debug,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();
}
