use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{JobPost, JobPostQuery};
use crate::services::ingestion_service::RunOutcome;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_job_posts))
        .route("/sync", post(trigger_sync))
        .route("/cleanup", post(cleanup_expired))
}

#[derive(Debug, Serialize)]
struct CleanupResponse {
    deleted: u64,
}

/// GET /api/jobs - Stored job posts, newest first. Expired posts only with `include_expired=true`.
async fn list_job_posts(
    State(state): State<AppState>,
    Query(params): Query<JobPostQuery>,
) -> Result<Json<Vec<JobPost>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!("limit must be between 1 and {}", MAX_LIMIT)));
    }

    info!("GET /api/jobs - limit: {}, include_expired: {}", limit, params.include_expired);

    let posts = if params.include_expired {
        state.store.list_all(limit).await
    } else {
        state.store.list_active(limit).await
    }
    .map_err(|e| {
        error!("Failed to list job posts: {}", e);
        AppError::Db(e)
    })?;

    Ok(Json(posts))
}

/// POST /api/jobs/sync - Run the ingestion pipeline now
async fn trigger_sync(
    State(state): State<AppState>,
) -> Result<Json<RunOutcome>, AppError> {
    info!("POST /api/jobs/sync - manual trigger");

    match state.pipeline.run_once().await? {
        RunOutcome::AlreadyRunning => Err(AppError::Conflict("An ingestion run is already in progress".to_string())),
        RunOutcome::SourceUnavailable { reason } => Err(AppError::External(reason)),
        outcome @ RunOutcome::Completed(_) => Ok(Json(outcome)),
    }
}

/// POST /api/jobs/cleanup - Delete posts past their expiry
async fn cleanup_expired(
    State(state): State<AppState>,
) -> Result<Json<CleanupResponse>, AppError> {
    info!("POST /api/jobs/cleanup");

    let deleted = state.store.delete_expired().await?;
    Ok(Json(CleanupResponse { deleted }))
}
