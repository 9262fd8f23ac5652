//! Read access to candidates and the job catalog.

pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;

pub use postgres::PgMatchingRepository;

/// Carried in `AppState` as `Arc<dyn MatchingRepository>`.
#[async_trait]
pub trait MatchingRepository: Send + Sync {
    /// Full scoring profile, including the latest resume analysis.
    async fn fetch_candidate(&self, candidate_id: Uuid) -> Result<Option<CandidateProfile>>;

    async fn candidate_exists(&self, candidate_id: Uuid) -> Result<bool>;

    /// A bounded batch of candidate profiles for background work.
    async fn list_candidates(&self, limit: usize) -> Result<Vec<CandidateProfile>>;

    /// Active postings whose deadline is unset or not before `now`, newest first.
    async fn fetch_active_jobs(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<JobPosting>>;

    /// Postings by id, regardless of whether they are still active.
    async fn fetch_jobs(&self, job_ids: &[Uuid]) -> Result<Vec<JobPosting>>;
}
