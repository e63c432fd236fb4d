use async_trait::async_trait;

use crate::errors::SourceError;
use crate::models::RawCandidate;

/// Where raw posting texts come from. Implementations skip individual bad items
/// themselves and only fail for problems with the source as a whole.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch_candidates(&self) -> Result<Vec<RawCandidate>, SourceError>;
}
