pub mod job_posts;

pub use job_posts::{JobPostStore, PgJobPostStore};
