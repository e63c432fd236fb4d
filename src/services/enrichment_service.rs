use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::EnrichmentError;
use crate::external::gemini::DEFAULT_BASE_URL;
use crate::external::generative::GenerativeBackend;
use crate::models::{ExtractedFields, KeyState};
use crate::services::rotation::RotationPool;

/// Upper bound on backend calls for a single extraction, regardless of pool sizes.
pub const MAX_ATTEMPTS_CAP: usize = 10;

pub const DEFAULT_MODELS: [&str; 4] = [
    "models/gemini-2.5-flash",
    "models/gemini-2.5-flash-lite",
    "models/gemini-2.5-flash-preview-tts",
    "models/gemini-3-flash-preview",
];

const DEFAULT_EXTRACTION_PROMPT: &str = "Extract job data from the user input and return STRICT JSON only. \
No markdown, no extra text. Use these keys: job_name, job_type, price, expiry_date, description. \
description should explain the job very well. \
Use English for all the fields, even if the input is in Amharic or any other language translate it to English. \
expiry_date should be an ISO-8601 date or date-time when the post states a deadline. \
If a field is missing, use an empty string.";

/// Configuration for the AI enrichment client
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_keys: Option<String>,
    pub api_key: Option<String>,
    pub models: Vec<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_keys: None,
            api_key: None,
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl AiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let models: Vec<String> = std::env::var("GEMINI_MODELS")
            .map(|raw| {
                raw.split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            api_keys: std::env::var("GEMINI_API_KEYS").ok(),
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            models: if models.is_empty() { defaults.models } else { models },
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    pub fn credential_pool(&self) -> RotationPool {
        RotationPool::from_sources([self.api_keys.as_deref(), self.api_key.as_deref()])
    }

    pub fn model_pool(&self) -> RotationPool {
        let pool = RotationPool::new(self.models.clone());
        if pool.is_empty() {
            RotationPool::new(DEFAULT_MODELS.iter().map(|m| m.to_string()).collect())
        } else {
            pool
        }
    }
}

pub type EnrichmentResult = Result<ExtractedFields, EnrichmentError>;

/// Turns free-text postings into structured fields via a generative backend,
/// rotating credential and model to ride out per-key quota exhaustion.
pub struct EnrichmentClient {
    credentials: Arc<RotationPool>,
    models: Arc<RotationPool>,
    backend: Arc<dyn GenerativeBackend>,
}

impl EnrichmentClient {
    pub fn new(
        credentials: Arc<RotationPool>,
        models: Arc<RotationPool>,
        backend: Arc<dyn GenerativeBackend>,
    ) -> Self {
        if credentials.is_empty() {
            warn!("No Gemini API keys configured. Extraction calls will report a missing credential.");
        } else {
            info!(
                "Initializing enrichment client with {} API key(s) and {} model(s)",
                credentials.len(),
                models.len()
            );
        }

        Self { credentials, models, backend }
    }

    pub fn max_attempts(&self) -> usize {
        (self.credentials.len() * self.models.len()).min(MAX_ATTEMPTS_CAP)
    }

    pub async fn extract(&self, text: &str, prompt_template: Option<&str>) -> EnrichmentResult {
        if self.credentials.current().is_none() {
            return Err(EnrichmentError::CredentialMissing);
        }

        let prompt = build_prompt(text, prompt_template);
        let max_attempts = self.max_attempts();

        for attempt in 0..max_attempts {
            let (Some(credential), Some(model)) = (self.credentials.current(), self.models.current()) else {
                return Err(EnrichmentError::CredentialMissing);
            };

            match self.backend.generate(credential, model, &prompt).await {
                Ok(response) => {
                    // Spread load across keys after a clean first try; retried calls already moved on.
                    if attempt == 0 {
                        self.rotate();
                    }
                    return parse_fields(&response);
                }
                Err(e) if e.is_quota_exhausted() => {
                    if attempt + 1 < max_attempts {
                        warn!(
                            "Quota exhausted on attempt {}/{} (model: {}): {}. Rotating key and model.",
                            attempt + 1, max_attempts, model, e
                        );
                        self.rotate();
                        continue;
                    }

                    error!("All API keys and models exhausted after {} attempts", max_attempts);
                    return Err(EnrichmentError::QuotaExhausted(e.to_string()));
                }
                Err(e) => {
                    error!("Extraction failed (model: {}): {}", model, e);
                    return Err(EnrichmentError::UpstreamError(e.to_string()));
                }
            }
        }

        Err(EnrichmentError::QuotaExhausted("Max retries exceeded".to_string()))
    }

    pub async fn list_available_models(&self) -> Result<Vec<String>, EnrichmentError> {
        let credential = self.credentials.current()
            .ok_or(EnrichmentError::CredentialMissing)?;

        self.backend
            .list_models(credential)
            .await
            .map_err(|e| EnrichmentError::UpstreamError(format!("Error listing models: {}", e)))
    }

    pub fn key_state(&self) -> KeyState {
        KeyState {
            keys_loaded: self.credentials.len(),
            active_index: self.credentials.index(),
            masked_keys: self.credentials.masked(),
            model_name: self.models.current().unwrap_or_default().to_string(),
        }
    }

    fn rotate(&self) {
        self.credentials.advance();
        self.models.advance();
    }
}

fn build_prompt(text: &str, prompt_template: Option<&str>) -> String {
    let instruction = prompt_template.unwrap_or(DEFAULT_EXTRACTION_PROMPT);
    format!("{}\n\nInput:\n{}", instruction, text)
}

/// Strips one optional leading and trailing markdown fence.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

fn parse_fields(response: &str) -> EnrichmentResult {
    match serde_json::from_str::<Value>(strip_code_fence(response)) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(EnrichmentError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            other
        ))),
        Err(e) => Err(EnrichmentError::MalformedResponse(e.to_string())),
    }
}
