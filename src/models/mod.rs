mod candidate;
mod enrichment;
mod job_post;

pub use candidate::RawCandidate;
pub use enrichment::{fields, ExtractRequest, ExtractedFields, KeyState};
pub use job_post::{CreateJobPost, JobPost, JobPostQuery};
