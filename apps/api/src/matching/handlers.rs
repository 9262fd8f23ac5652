use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::recommender::{clamp_limit, RecommendationResponse};
use crate::models::job::{ExperienceLevel, JobPosting};
use crate::state::AppState;

const DEFAULT_MATCHES_LIMIT: usize = 20;
const MAX_MATCHES_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub candidate_id: Uuid,
    pub limit: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

/// GET /api/v1/recommendations
pub async fn handle_get_recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationQuery>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let limit = clamp_limit(params.limit);
    let response = state
        .recommender
        .recommend(params.candidate_id, limit, params.refresh)
        .await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    pub candidate_id: Uuid,
    pub limit: Option<usize>,
}

/// Display fields of the matched posting, when it still exists.
#[derive(Debug, Serialize)]
pub struct MatchedJob {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub remote_allowed: bool,
    pub logo_url: Option<String>,
}

impl From<JobPosting> for MatchedJob {
    fn from(job: JobPosting) -> Self {
        MatchedJob {
            title: job.title,
            company: job.employer.company_name,
            location: job.location,
            employment_type: job.employment_type,
            experience_level: job.experience_level,
            remote_allowed: job.remote_allowed,
            logo_url: job.employer.logo_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoredMatch {
    pub job_id: Uuid,
    pub match_score: f64,
    pub details: Value,
    pub background_calculated: bool,
    pub calculated_at: DateTime<Utc>,
    pub job: Option<MatchedJob>,
}

#[derive(Debug, Serialize)]
pub struct MatchesResponse {
    pub matches: Vec<StoredMatch>,
    pub total: usize,
}

/// GET /api/v1/recommendations/matches
pub async fn handle_get_matches(
    State(state): State<AppState>,
    Query(params): Query<MatchesQuery>,
) -> Result<Json<MatchesResponse>, AppError> {
    if !state.repository.candidate_exists(params.candidate_id).await? {
        return Err(AppError::NotFound(format!(
            "Candidate {} not found",
            params.candidate_id
        )));
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_MATCHES_LIMIT)
        .clamp(1, MAX_MATCHES_LIMIT);
    let rows = state.analytics.job_matches(params.candidate_id, limit).await?;

    let job_ids: Vec<Uuid> = rows.iter().map(|row| row.job_id).collect();
    let mut jobs: HashMap<Uuid, JobPosting> = state
        .repository
        .fetch_jobs(&job_ids)
        .await?
        .into_iter()
        .map(|job| (job.job_id, job))
        .collect();

    let matches: Vec<StoredMatch> = rows
        .into_iter()
        .map(|row| StoredMatch {
            job: jobs.remove(&row.job_id).map(MatchedJob::from),
            job_id: row.job_id,
            match_score: row.match_score,
            details: row.details,
            background_calculated: row.background_calculated,
            calculated_at: row.calculated_at,
        })
        .collect();

    Ok(Json(MatchesResponse {
        total: matches.len(),
        matches,
    }))
}
