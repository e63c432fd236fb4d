pub mod candidate_source;
pub mod gemini;
pub mod generative;
pub mod telegram;
