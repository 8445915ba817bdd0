use std::{future::Future, sync::Arc};

use anyhow::Context;
use restaurant_recs::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, SqliteRestaurantStore},
    services::{build_provider, RecommendationEngine, RetryPolicy},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init_tracing();

    let llm_settings = config.llm_settings()?;
    let retry = RetryPolicy::new(config.retry_settings()?);

    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(SqliteRestaurantStore::new(pool));
    let provider = build_provider(&llm_settings)?;

    let engine = RecommendationEngine::new(store, provider, retry);
    let app = create_router(AppState::new(engine));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %addr,
        provider = %llm_settings.provider,
        model = %llm_settings.model,
        max_attempts = retry.max_attempts(),
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

async fn wait_for_shutdown(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // Without a signal handler the server runs until killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
