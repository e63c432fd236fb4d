pub mod job_post_queries;
