use async_trait::async_trait;

use crate::errors::BackendError;

/// A remote text-generation service addressed by credential and model.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(
        &self,
        credential: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, BackendError>;

    async fn list_models(&self, credential: &str) -> Result<Vec<String>, BackendError>;
}
