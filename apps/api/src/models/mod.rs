pub mod analytics;
pub mod candidate;
pub mod job;
