use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use expo_pricing::{
    config::AppConfig,
    create_router, db,
    pricing::{PerformanceMetrics, PgCatalogStore, PricingService},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // RUST_LOG wins; otherwise info for everything
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Expo Pricing API - Starting...");

    let config = AppConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&db_pool).await?;

    let metrics = PerformanceMetrics::with_slow_threshold(config.slow_quote_threshold_ms);
    let store = Arc::new(PgCatalogStore::new(db_pool));
    let state = AppState {
        pricing: Arc::new(PricingService::new(store, metrics.clone())),
    };

    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Expo Pricing API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    metrics.log_summary();
    Ok(())
}
