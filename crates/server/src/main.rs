use std::sync::Arc;

use anyhow::Context;
use db::DBService;
use server::{AppState, config::AppConfig, routes};
use services::services::{auth::GoogleJwksVerifier, database_validator::DatabaseValidator};
use tracing::{info, warn};
use utils::log::{init_sentry, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let sentry_guard = init_sentry(config.sentry_dsn.as_deref(), &config.environment);
    init_tracing(sentry_guard.is_some());

    let db = DBService::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    let validator = DatabaseValidator::new(db.pool.clone());
    validator
        .ensure_schema()
        .await
        .context("database schema is incomplete")?;
    let validation = validator.validate().await?;
    if validation.is_ok() {
        info!("{}", validation.summary());
    } else {
        warn!("{}", validation.summary());
    }

    let verifier = Arc::new(GoogleJwksVerifier::new(config.google_client_id.clone()));
    let state = AppState::new(&config, db, verifier);
    let app = routes::router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
