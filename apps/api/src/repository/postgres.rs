use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::candidate::{CandidateProfile, CandidateRow, WorkPeriod};
use crate::models::job::{JobPosting, JobRow};
use crate::repository::MatchingRepository;

const CANDIDATE_SELECT: &str = r#"
    SELECT c.id,
           c.experience_years,
           c.location,
           c.expected_salary::float8 AS expected_salary,
           COALESCE(array_agg(s.name ORDER BY s.name) FILTER (WHERE s.name IS NOT NULL), '{}') AS skills,
           (SELECT ra.ai_analysis
              FROM resume_analyses ra
             WHERE ra.candidate_id = c.id
             ORDER BY ra.uploaded_at DESC
             LIMIT 1) AS resume_analysis
    FROM candidates c
    LEFT JOIN candidate_skills cs ON cs.candidate_id = c.id
    LEFT JOIN skills s ON s.id = cs.skill_id
"#;

const JOB_SELECT: &str = r#"
    SELECT j.id,
           j.title,
           j.description,
           j.requirements,
           COALESCE(array_agg(s.name ORDER BY s.name) FILTER (WHERE s.name IS NOT NULL), '{}') AS skills,
           j.experience_level,
           j.employment_type,
           j.location,
           j.remote_allowed,
           j.salary_min::float8 AS salary_min,
           j.salary_max::float8 AS salary_max,
           j.currency,
           e.company_name,
           e.logo_url,
           e.industry,
           j.created_at,
           j.application_deadline
    FROM jobs j
    JOIN employers e ON e.id = j.employer_id
    LEFT JOIN job_skills js ON js.job_id = j.id
    LEFT JOIN skills s ON s.id = js.skill_id
"#;

/// Postgres-backed candidate and job reads.
#[derive(Clone)]
pub struct PgMatchingRepository {
    pool: PgPool,
}

impl PgMatchingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// CV work periods for the given candidates, grouped by candidate.
    async fn work_history(&self, candidate_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<WorkPeriod>>> {
        let periods = sqlx::query_as::<_, WorkPeriod>(
            r#"
            SELECT candidate_id, job_title, company, start_date, end_date, is_current
            FROM work_experiences
            WHERE candidate_id = ANY($1)
            ORDER BY start_date DESC
            "#,
        )
        .bind(candidate_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<WorkPeriod>> = HashMap::new();
        for period in periods {
            grouped.entry(period.candidate_id).or_default().push(period);
        }
        Ok(grouped)
    }

    async fn build_profiles(&self, rows: Vec<CandidateRow>) -> Result<Vec<CandidateProfile>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let history = self.work_history(&ids).await?;
        let today = Utc::now().date_naive();

        Ok(rows
            .into_iter()
            .map(|row| {
                let periods = history.get(&row.id).map(Vec::as_slice).unwrap_or(&[]);
                row.into_profile(periods, today)
            })
            .collect())
    }
}

#[async_trait]
impl MatchingRepository for PgMatchingRepository {
    async fn fetch_candidate(&self, candidate_id: Uuid) -> Result<Option<CandidateProfile>> {
        let query = format!("{CANDIDATE_SELECT} WHERE c.id = $1 GROUP BY c.id");
        let row = sqlx::query_as::<_, CandidateRow>(&query)
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.build_profiles(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn candidate_exists(&self, candidate_id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM candidates WHERE id = $1)")
                .bind(candidate_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn list_candidates(&self, limit: usize) -> Result<Vec<CandidateProfile>> {
        let query = format!("{CANDIDATE_SELECT} GROUP BY c.id ORDER BY c.id LIMIT $1");
        let rows = sqlx::query_as::<_, CandidateRow>(&query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        self.build_profiles(rows).await
    }

    async fn fetch_active_jobs(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<JobPosting>> {
        let query = format!(
            "{JOB_SELECT}
             WHERE j.is_active
               AND (j.application_deadline IS NULL OR j.application_deadline >= $1)
             GROUP BY j.id, e.id
             ORDER BY j.created_at DESC
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, JobRow>(&query)
            .bind(now)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(JobPosting::from).collect())
    }

    async fn fetch_jobs(&self, job_ids: &[Uuid]) -> Result<Vec<JobPosting>> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("{JOB_SELECT} WHERE j.id = ANY($1) GROUP BY j.id, e.id");
        let rows = sqlx::query_as::<_, JobRow>(&query)
            .bind(job_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(JobPosting::from).collect())
    }
}
