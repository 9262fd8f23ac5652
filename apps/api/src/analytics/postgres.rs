use anyhow::Result;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::analytics::AnalyticsSink;
use crate::models::analytics::{
    AnalyticsFilter, FeedbackEvent, InteractionEvent, JobMatchRecord, JobMatchRow,
    RecommendationAnalytics,
};

/// Analytics tables live alongside the relational data; breakdowns and
/// metadata are JSONB so their shape can evolve without migrations.
#[derive(Clone)]
pub struct PgAnalyticsStore {
    pool: PgPool,
}

impl PgAnalyticsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsSink for PgAnalyticsStore {
    async fn save_job_match(&self, record: &JobMatchRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO job_matches
                (id, candidate_id, job_id, match_score, details, background_calculated, calculated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.candidate_id)
        .bind(record.job_id)
        .bind(record.match_score)
        .bind(Json(&record.details))
        .bind(record.background_calculated)
        .bind(record.calculated_at)
        .execute(&self.pool)
        .await?;

        debug!(
            "Saved job match candidate={} job={} score={:.1}",
            record.candidate_id, record.job_id, record.match_score
        );
        Ok(())
    }

    async fn save_interaction(&self, event: &InteractionEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recommendation_interactions
                (id, candidate_id, job_id, action, match_score, metadata, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id)
        .bind(event.candidate_id)
        .bind(event.job_id)
        .bind(event.action.as_str())
        .bind(event.match_score)
        .bind(Json(&event.metadata))
        .bind(event.user_agent.as_deref())
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_feedback(&self, event: &FeedbackEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recommendation_feedback
                (id, candidate_id, job_id, rating, feedback, improvement_suggestions, processed, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id)
        .bind(event.candidate_id)
        .bind(event.job_id)
        .bind(event.rating)
        .bind(&event.feedback)
        .bind(&event.improvement_suggestions)
        .bind(event.processed)
        .bind(event.submitted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn job_matches(&self, candidate_id: Uuid, limit: usize) -> Result<Vec<JobMatchRow>> {
        Ok(sqlx::query_as::<_, JobMatchRow>(
            r#"
            SELECT * FROM (
                SELECT DISTINCT ON (job_id) *
                FROM job_matches
                WHERE candidate_id = $1
                ORDER BY job_id, calculated_at DESC
            ) latest
            ORDER BY match_score DESC
            LIMIT $2
            "#,
        )
        .bind(candidate_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn recommendation_analytics(
        &self,
        filter: &AnalyticsFilter,
    ) -> Result<RecommendationAnalytics> {
        let by_action: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT action, COUNT(*)
            FROM recommendation_interactions
            WHERE created_at BETWEEN $1 AND $2
              AND ($3::uuid IS NULL OR candidate_id = $3)
            GROUP BY action
            "#,
        )
        .bind(filter.start)
        .bind(filter.end)
        .bind(filter.candidate_id)
        .fetch_all(&self.pool)
        .await?;

        let (feedback_count, average_rating): (i64, Option<f64>) = sqlx::query_as(
            r#"
            SELECT COUNT(*), AVG(rating)::float8
            FROM recommendation_feedback
            WHERE submitted_at BETWEEN $1 AND $2
              AND ($3::uuid IS NULL OR candidate_id = $3)
            "#,
        )
        .bind(filter.start)
        .bind(filter.end)
        .bind(filter.candidate_id)
        .fetch_one(&self.pool)
        .await?;

        let (matches_computed, background_matches, average_match_score): (i64, i64, Option<f64>) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE background_calculated),
                       AVG(match_score)::float8
                FROM job_matches
                WHERE calculated_at BETWEEN $1 AND $2
                  AND ($3::uuid IS NULL OR candidate_id = $3)
                "#,
            )
            .bind(filter.start)
            .bind(filter.end)
            .bind(filter.candidate_id)
            .fetch_one(&self.pool)
            .await?;

        let total_interactions = by_action.iter().map(|(_, count)| count).sum();

        Ok(RecommendationAnalytics {
            total_interactions,
            interactions_by_action: by_action.into_iter().collect(),
            feedback_count,
            average_rating,
            matches_computed,
            background_matches,
            average_match_score,
        })
    }
}
