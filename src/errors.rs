use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] StoreError),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found")]
    NotFound,
    #[error("Rate limited by external provider")]
    RateLimited,
    #[error("External error: {0}")]
    External(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (StatusCode::TOO_MANY_REQUESTS, headers, "Rate limited").into_response()
            },
            AppError::External(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response(),
        }
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(value)
    }
}

impl From<EnrichmentError> for AppError {
    fn from(value: EnrichmentError) -> Self {
        match value {
            EnrichmentError::CredentialMissing => AppError::External(value.to_string()),
            EnrichmentError::QuotaExhausted(_) => AppError::RateLimited,
            EnrichmentError::UpstreamError(msg) | EnrichmentError::MalformedResponse(msg) => {
                AppError::External(msg)
            }
        }
    }
}

impl From<IngestionError> for AppError {
    fn from(value: IngestionError) -> Self {
        match value {
            IngestionError::Persistence(e) => AppError::Db(e),
        }
    }
}

/// Failures reported by the generative text backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP 429: {0}")]
    RateLimited(String),
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Quota exhaustion shows up either as a 429 or as a RESOURCE_EXHAUSTED status in the body.
    pub fn is_quota_exhausted(&self) -> bool {
        match self {
            BackendError::RateLimited(_) => true,
            BackendError::Api { status, body } => *status == 429 || body.contains("RESOURCE_EXHAUSTED"),
            other => other.to_string().contains("RESOURCE_EXHAUSTED"),
        }
    }
}

/// Outcome of a failed extraction. Returned as a value, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichmentError {
    #[error("Gemini API key is missing. Set GEMINI_API_KEY or GEMINI_API_KEYS in your .env file.")]
    CredentialMissing,
    #[error("All API keys and models exhausted. Last error: {0}")]
    QuotaExhausted(String),
    #[error("{0}")]
    UpstreamError(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("bad response: {0}")]
    BadResponse(String),
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
#[error("persistence error: {0}")]
pub struct StoreError(#[from] pub sqlx::Error);

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("batch was rolled back: {0}")]
    Persistence(#[from] StoreError),
}
