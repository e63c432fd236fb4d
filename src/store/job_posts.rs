use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::job_post_queries;
use crate::errors::StoreError;
use crate::models::{CreateJobPost, JobPost};

/// Persistence for enriched job posts.
#[async_trait]
pub trait JobPostStore: Send + Sync {
    /// Appends the batch atomically and returns the committed row count.
    async fn append(&self, posts: &[CreateJobPost]) -> Result<u64, StoreError>;

    /// Removes posts whose `expires_at` has passed.
    async fn delete_expired(&self) -> Result<u64, StoreError>;

    async fn list_active(&self, limit: i64) -> Result<Vec<JobPost>, StoreError>;

    async fn list_all(&self, limit: i64) -> Result<Vec<JobPost>, StoreError>;
}

#[derive(Clone)]
pub struct PgJobPostStore {
    pool: PgPool,
}

impl PgJobPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobPostStore for PgJobPostStore {
    async fn append(&self, posts: &[CreateJobPost]) -> Result<u64, StoreError> {
        Ok(job_post_queries::insert_job_posts(&self.pool, posts).await?)
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        Ok(job_post_queries::delete_expired(&self.pool).await?)
    }

    async fn list_active(&self, limit: i64) -> Result<Vec<JobPost>, StoreError> {
        Ok(job_post_queries::list_active(&self.pool, limit).await?)
    }

    async fn list_all(&self, limit: i64) -> Result<Vec<JobPost>, StoreError> {
        Ok(job_post_queries::list_all(&self.pool, limit).await?)
    }
}
