use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields extracted from a posting, keyed by field name.
pub type ExtractedFields = Map<String, Value>;

/// Keys the default extraction prompt asks the model to produce.
pub mod fields {
    pub const JOB_NAME: &str = "job_name";
    pub const JOB_TYPE: &str = "job_type";
    pub const PRICE: &str = "price";
    pub const EXPIRY_DATE: &str = "expiry_date";
    pub const DESCRIPTION: &str = "description";
    pub const ERROR: &str = "error";
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
    pub prompt_template: Option<String>,
}

/// Non-sensitive snapshot of the credential and model rotation state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyState {
    pub keys_loaded: usize,
    pub active_index: Option<usize>,
    pub masked_keys: Vec<String>,
    pub model_name: String,
}
