use std::sync::Arc;

use crate::external::telegram::TelegramChannelSource;
use crate::services::enrichment_service::EnrichmentClient;
use crate::services::ingestion_service::IngestionPipeline;
use crate::store::JobPostStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobPostStore>,
    pub pipeline: Arc<IngestionPipeline>,
    pub enrichment: Arc<EnrichmentClient>,
    pub telegram: Arc<TelegramChannelSource>,
}
