//! Recommendation analytics: the append-only sink for match records,
//! interactions and feedback, plus the tracker/collector front doors.

pub mod handlers;
pub mod postgres;
pub mod tracker;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::analytics::{
    AnalyticsFilter, FeedbackEvent, InteractionEvent, JobMatchRecord, JobMatchRow,
    RecommendationAnalytics,
};

pub use postgres::PgAnalyticsStore;
pub use tracker::{FeedbackCollector, InteractionTracker};

/// Carried in `AppState` as `Arc<dyn AnalyticsSink>`. Writes are appends only.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn save_job_match(&self, record: &JobMatchRecord) -> Result<()>;

    async fn save_interaction(&self, event: &InteractionEvent) -> Result<()>;

    async fn save_feedback(&self, event: &FeedbackEvent) -> Result<()>;

    /// Most recent match per job for a candidate, highest score first.
    async fn job_matches(&self, candidate_id: Uuid, limit: usize) -> Result<Vec<JobMatchRow>>;

    async fn recommendation_analytics(
        &self,
        filter: &AnalyticsFilter,
    ) -> Result<RecommendationAnalytics>;
}
