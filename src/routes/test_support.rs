use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use axum::Router;

use crate::app::create_app;
use crate::errors::{BackendError, SourceError};
use crate::external::candidate_source::CandidateSource;
use crate::external::generative::GenerativeBackend;
use crate::external::telegram::{TelegramChannelSource, TelegramConfig};
use crate::models::RawCandidate;
use crate::services::enrichment_service::EnrichmentClient;
use crate::services::ingestion_service::IngestionPipeline;
use crate::services::rotation::RotationPool;
use crate::state::AppState;
use crate::store::job_posts::memory::MemoryJobPostStore;

pub struct FixedSource(pub Vec<RawCandidate>);

#[async_trait]
impl CandidateSource for FixedSource {
    async fn fetch_candidates(&self) -> Result<Vec<RawCandidate>, SourceError> {
        Ok(self.0.clone())
    }
}

pub struct QueuedBackend(pub Mutex<VecDeque<Result<String, BackendError>>>);

#[async_trait]
impl GenerativeBackend for QueuedBackend {
    async fn generate(&self, _credential: &str, _model: &str, _prompt: &str) -> Result<String, BackendError> {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Network("no scripted response".to_string())))
    }

    async fn list_models(&self, _credential: &str) -> Result<Vec<String>, BackendError> {
        Ok(vec!["models/gemini-2.5-flash".to_string()])
    }
}

/// Router wired to in-memory collaborators.
pub struct TestApp {
    pub store: Arc<MemoryJobPostStore>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(vec![], vec![], &["test-key-0001-abcd"])
    }

    pub fn with(
        candidates: Vec<RawCandidate>,
        responses: Vec<Result<String, BackendError>>,
        keys: &[&str],
    ) -> Self {
        let store = Arc::new(MemoryJobPostStore::default());
        let enrichment = Arc::new(EnrichmentClient::new(
            Arc::new(RotationPool::new(keys.iter().map(|k| k.to_string()).collect())),
            Arc::new(RotationPool::new(vec!["models/gemini-2.5-flash".to_string()])),
            Arc::new(QueuedBackend(Mutex::new(responses.into()))),
        ));
        let pipeline = Arc::new(IngestionPipeline::new(
            Arc::new(FixedSource(candidates)),
            enrichment.clone(),
            store.clone(),
        ));

        Self {
            store: store.clone(),
            state: AppState { store, pipeline, enrichment, telegram: Arc::new(channel_preview("http://127.0.0.1:9")) },
        }
    }

    /// Points the channel preview routes at `base_url`, e.g. a mock server.
    pub fn with_telegram(mut self, base_url: &str) -> Self {
        self.state.telegram = Arc::new(channel_preview(base_url));
        self
    }

    pub fn router(&self) -> Router {
        create_app(self.state.clone())
    }
}

fn channel_preview(base_url: &str) -> TelegramChannelSource {
    TelegramChannelSource::new(TelegramConfig {
        base_url: base_url.to_string(),
        ..TelegramConfig::default()
    })
    .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
