pub mod enrichment_service;
pub mod ingestion_service;
pub mod job_scheduler_service;
pub mod rotation;
pub mod ttl;
