use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scraped job posting after enrichment, as stored in `job_posts`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobPost {
    pub id: Uuid,
    pub job_name: String,
    pub job_type: String,
    pub price: String,
    /// Deadline exactly as the model extracted it
    pub expiry_date: String,
    pub description: String,
    pub deep_link: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub ttl_hours: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for appending a job post. `expires_at` is derived, never supplied by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateJobPost {
    pub job_name: String,
    pub job_type: String,
    pub price: String,
    pub expiry_date: String,
    pub description: String,
    pub deep_link: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub ttl_hours: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPostQuery {
    pub limit: Option<i64>,
    #[serde(default)]
    pub include_expired: bool,
}
