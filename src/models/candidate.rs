use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unprocessed posting text as handed over by a text source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub text: String,
    pub deep_link: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}
