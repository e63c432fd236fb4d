mod app;
mod db;
mod errors;
mod external;
mod logging;
mod models;
mod routes;
mod services;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use crate::external::gemini::GeminiBackend;
use crate::external::telegram::{TelegramChannelSource, TelegramConfig};
use crate::logging::LoggingConfig;
use crate::services::enrichment_service::{AiConfig, EnrichmentClient};
use crate::services::ingestion_service::IngestionPipeline;
use crate::services::job_scheduler_service::{JobContext, JobSchedulerService, SchedulerConfig};
use crate::state::AppState;
use crate::store::{JobPostStore, PgJobPostStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let ai_config = AiConfig::from_env();
    let backend = GeminiBackend::new(ai_config.base_url.clone(), ai_config.timeout)?;
    let enrichment = Arc::new(EnrichmentClient::new(
        Arc::new(ai_config.credential_pool()),
        Arc::new(ai_config.model_pool()),
        Arc::new(backend),
    ));

    let telegram = Arc::new(TelegramChannelSource::new(TelegramConfig::from_env())?);
    let store: Arc<dyn JobPostStore> = Arc::new(PgJobPostStore::new(pool));
    let pipeline = Arc::new(IngestionPipeline::new(
        telegram.clone(),
        enrichment.clone(),
        store.clone(),
    ));

    let mut scheduler = JobSchedulerService::new(
        JobContext { pipeline: pipeline.clone(), store: store.clone() },
        SchedulerConfig::from_env(),
    )
    .await?;
    scheduler.start().await?;

    let state = AppState { store, pipeline, enrichment, telegram };
    let app = app::create_app(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()
        .context("BIND_ADDR must be a socket address")?;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Jobfeed backend running at http://{}/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
