use crate::errors::AppError;
use crate::services::ingestion_service::{IngestionPipeline, RunOutcome};
use crate::store::JobPostStore;
use tokio_cron_scheduler::{JobScheduler, Job};
use tracing::{info, error, warn};
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub sync_schedule: String,
    pub cleanup_schedule: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // format: sec min hour day month weekday
            sync_schedule: "0 0 */6 * * *".to_string(),
            cleanup_schedule: "0 30 * * * *".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .ok()
                .and_then(|s| s.parse::<bool>().ok())
                .unwrap_or(defaults.enabled),
            sync_schedule: std::env::var("SYNC_SCHEDULE").unwrap_or(defaults.sync_schedule),
            cleanup_schedule: std::env::var("CLEANUP_SCHEDULE").unwrap_or(defaults.cleanup_schedule),
        }
    }
}

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub pipeline: Arc<IngestionPipeline>,
    pub store: Arc<dyn JobPostStore>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct JobResult {
    pub items_processed: u64,
    pub items_failed: u64,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
    config: SchedulerConfig,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext, config: SchedulerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context,
            config,
        })
    }

    /// Start all scheduled jobs
    pub async fn start(&mut self) -> Result<(), AppError> {
        if !self.config.enabled {
            info!("⏸️  Job scheduler disabled (SCHEDULER_ENABLED=false)");
            return Ok(());
        }

        info!("🚀 Starting job scheduler...");

        let sync_schedule = self.config.sync_schedule.clone();
        self.schedule_job(&sync_schedule, "sync_job_posts", sync_job_posts).await?;

        let cleanup_schedule = self.config.cleanup_schedule.clone();
        self.schedule_job(&cleanup_schedule, "cleanup_expired_posts", cleanup_expired_posts).await?;

        self.scheduler.start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started successfully with 2 jobs");
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler.shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    /// Helper to schedule a job with tracking
    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job_with_tracking(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler.add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} [cron: {}]", job_name, schedule);
        Ok(())
    }
}

// Job tracking wrapper; a failing run is logged and the scheduler keeps going
async fn execute_job_with_tracking<F, Fut>(
    job_name: &str,
    context: JobContext,
    job_fn: Arc<F>,
) -> Option<JobResult>
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn(context).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );
            Some(job_result)
        }
        Err(e) => {
            error!("❌ Job failed: {} - {} (duration: {}ms)", job_name, e, duration_ms);
            None
        }
    }
}

pub async fn sync_job_posts(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("📥 Syncing job posts...");

    match ctx.pipeline.run_once().await? {
        RunOutcome::Completed(report) => Ok(JobResult {
            items_processed: report.persisted,
            items_failed: report.skipped as u64,
        }),
        RunOutcome::SourceUnavailable { reason } => {
            warn!("Source unavailable, will retry on next schedule: {}", reason);
            Ok(JobResult::default())
        }
        RunOutcome::AlreadyRunning => {
            info!("Previous sync still running, skipping");
            Ok(JobResult::default())
        }
    }
}

pub async fn cleanup_expired_posts(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("🧹 Cleaning up expired job posts...");

    let deleted = ctx.store.delete_expired().await?;
    info!("🗑️ Deleted {} expired job posts", deleted);

    Ok(JobResult { items_processed: deleted, items_failed: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{BackendError, SourceError};
    use crate::external::candidate_source::CandidateSource;
    use crate::external::generative::GenerativeBackend;
    use crate::models::{CreateJobPost, RawCandidate};
    use crate::services::enrichment_service::EnrichmentClient;
    use crate::services::rotation::RotationPool;
    use crate::store::job_posts::memory::MemoryJobPostStore;
    use async_trait::async_trait;
    use chrono::Duration;

    struct NoCandidates;

    #[async_trait]
    impl CandidateSource for NoCandidates {
        async fn fetch_candidates(&self) -> Result<Vec<RawCandidate>, SourceError> {
            Ok(vec![])
        }
    }

    struct UnusedBackend;

    #[async_trait]
    impl GenerativeBackend for UnusedBackend {
        async fn generate(&self, _: &str, _: &str, _: &str) -> Result<String, BackendError> {
            Err(BackendError::Network("not expected".to_string()))
        }

        async fn list_models(&self, _: &str) -> Result<Vec<String>, BackendError> {
            Ok(vec![])
        }
    }

    fn context(store: Arc<MemoryJobPostStore>) -> JobContext {
        let enrichment = Arc::new(EnrichmentClient::new(
            Arc::new(RotationPool::new(vec![])),
            Arc::new(RotationPool::new(vec!["m1".to_string()])),
            Arc::new(UnusedBackend),
        ));
        JobContext {
            pipeline: Arc::new(IngestionPipeline::new(Arc::new(NoCandidates), enrichment, store.clone())),
            store,
        }
    }

    fn post(name: &str, expires_in_hours: i64) -> CreateJobPost {
        CreateJobPost {
            job_name: name.to_string(),
            job_type: String::new(),
            price: String::new(),
            expiry_date: String::new(),
            description: String::new(),
            deep_link: None,
            posted_at: None,
            ttl_hours: None,
            expires_at: Some(Utc::now() + Duration::hours(expires_in_hours)),
        }
    }

    #[tokio::test]
    async fn test_cleanup_job_counts_deleted_rows() {
        let store = Arc::new(MemoryJobPostStore::default());
        store.insert(post("stale", -2));
        store.insert(post("fresh", 2));

        let result = cleanup_expired_posts(context(store.clone())).await.unwrap();

        assert_eq!(result, JobResult { items_processed: 1, items_failed: 0 });
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_job_with_nothing_to_do() {
        let store = Arc::new(MemoryJobPostStore::default());
        let result = sync_job_posts(context(store)).await.unwrap();
        assert_eq!(result, JobResult::default());
    }

    #[tokio::test]
    async fn test_tracking_swallows_failures() {
        let store = Arc::new(MemoryJobPostStore::default());
        let failing = Arc::new(|_ctx: JobContext| async { Err::<JobResult, _>(AppError::External("boom".to_string())) });

        let result = execute_job_with_tracking("failing", context(store), failing).await;

        assert!(result.is_none());
    }

    #[test]
    fn test_default_schedules_are_six_field_cron() {
        let config = SchedulerConfig::default();
        assert_eq!(config.sync_schedule.split_whitespace().count(), 6);
        assert_eq!(config.cleanup_schedule.split_whitespace().count(), 6);
    }
}
