use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::IngestionError;
use crate::external::candidate_source::CandidateSource;
use crate::models::{fields, CreateJobPost, ExtractedFields, RawCandidate};
use crate::services::enrichment_service::EnrichmentClient;
use crate::services::ttl;
use crate::store::JobPostStore;

/// Counters for one completed ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub fetched: usize,
    pub enriched: usize,
    pub skipped: usize,
    pub persisted: u64,
    pub cleaned: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed(RunReport),
    SourceUnavailable { reason: String },
    AlreadyRunning,
}

/// Fetch → extract → TTL → persist → cleanup.
///
/// Candidates are enriched one at a time; the extraction backend is rate-limit sensitive
/// and key rotation relies on calls being sequential. Overlapping runs are refused.
pub struct IngestionPipeline {
    source: Arc<dyn CandidateSource>,
    enrichment: Arc<EnrichmentClient>,
    store: Arc<dyn JobPostStore>,
    running: AtomicBool,
}

/// Clears the run-in-progress flag when the run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl IngestionPipeline {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        enrichment: Arc<EnrichmentClient>,
        store: Arc<dyn JobPostStore>,
    ) -> Self {
        Self {
            source,
            enrichment,
            store,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn run_once(&self) -> Result<RunOutcome, IngestionError> {
        if self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Ingestion run already in progress, skipping this trigger");
            return Ok(RunOutcome::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);

        info!("🔄 Fetching and processing job posts...");

        let candidates = match self.source.fetch_candidates().await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Error fetching posts: {}", e);
                return Ok(RunOutcome::SourceUnavailable { reason: e.to_string() });
            }
        };

        let mut report = RunReport {
            fetched: candidates.len(),
            ..RunReport::default()
        };
        info!("Retrieved {} candidate posts", report.fetched);

        let mut batch = Vec::new();
        for candidate in &candidates {
            let extracted = match self.enrichment.extract(&candidate.text, None).await {
                Ok(extracted) => extracted,
                Err(e) => {
                    warn!("Skipping post, extraction failed: {}", e);
                    report.skipped += 1;
                    continue;
                }
            };

            match build_job_post(&extracted, candidate) {
                Some(post) => {
                    match post.ttl_hours {
                        Some(hours) => info!(
                            "Job '{}' - TTL: {} hours, expires: {:?}",
                            post.job_name, hours, post.expires_at
                        ),
                        None => info!("Job '{}' - TTL: unknown", post.job_name),
                    }
                    batch.push(post);
                }
                None => {
                    let rejected = Value::Object(extracted);
                    warn!("Skipping invalid job data: {}", rejected);
                    report.skipped += 1;
                }
            }
        }
        report.enriched = batch.len();

        if batch.is_empty() {
            info!("No valid job posts to save");
            return Ok(RunOutcome::Completed(report));
        }

        report.persisted = self.store.append(&batch).await.map_err(|e| {
            error!("Error syncing job posts, batch rolled back: {}", e);
            IngestionError::Persistence(e)
        })?;
        info!("✅ Synced {} job posts to database", report.persisted);

        report.cleaned = match self.store.delete_expired().await {
            Ok(deleted) => {
                info!("🧹 Cleaned up {} expired jobs", deleted);
                deleted
            }
            Err(e) => {
                warn!("Error cleaning up expired jobs: {}", e);
                0
            }
        };

        Ok(RunOutcome::Completed(report))
    }
}

/// Maps extracted fields onto a storable record, or `None` when the mapping has no job name
/// or reports an error of its own.
pub fn build_job_post(extracted: &ExtractedFields, candidate: &RawCandidate) -> Option<CreateJobPost> {
    if extracted.contains_key(fields::ERROR) {
        return None;
    }

    let job_name = field_str(extracted, fields::JOB_NAME);
    if job_name.is_empty() {
        return None;
    }

    let expiry_date = field_str(extracted, fields::EXPIRY_DATE);
    let ttl_hours = ttl::compute_ttl_hours(Some(&expiry_date));
    let expires_at = ttl::derive_expires_at(candidate.posted_at, ttl_hours);

    Some(CreateJobPost {
        job_name,
        job_type: field_str(extracted, fields::JOB_TYPE),
        price: field_str(extracted, fields::PRICE),
        expiry_date,
        description: field_str(extracted, fields::DESCRIPTION),
        deep_link: candidate.deep_link.clone(),
        posted_at: candidate.posted_at,
        ttl_hours,
        expires_at,
    })
}

fn field_str(extracted: &ExtractedFields, key: &str) -> String {
    match extracted.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}
