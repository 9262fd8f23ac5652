//! Recommendation service: assembles a candidate's ranked job recommendations.
//!
//! Pipeline on a cache miss:
//! candidate + active jobs → remote match (local fallback) per job →
//! persist every match → rank → truncate → cache → respond.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::analytics::AnalyticsSink;
use crate::errors::AppError;
use crate::matching::cache::RecommendationCache;
use crate::matching::remote::RemoteMatchClient;
use crate::matching::scoring::{to_percent, MatchResult};
use crate::models::analytics::JobMatchRecord;
use crate::models::candidate::CandidateProfile;
use crate::models::job::{ExperienceLevel, JobPosting};
use crate::repository::MatchingRepository;

pub const DEFAULT_LIMIT: usize = 10;
/// Size of the job pool scored per request; also the largest accepted limit.
pub const MAX_ACTIVE_JOBS: usize = 50;
pub const DEFAULT_MATCH_CONCURRENCY: usize = 8;

const NO_ACTIVE_JOBS_MESSAGE: &str = "No active jobs available for matching";

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

/// A job posting annotated with its match. Scores are whole percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecommendation {
    pub job_id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub currency: Option<String>,
    pub remote_allowed: bool,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub match_score: u32,
    pub skills_match: u32,
    pub experience_match: u32,
    pub location_match: u32,
    pub salary_match: u32,
    pub reasoning: String,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub recommendations: Vec<String>,
    pub ai_confidence: f64,
    pub created_at: DateTime<Utc>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub logo_url: Option<String>,
}

impl JobRecommendation {
    fn new(job: &JobPosting, result: MatchResult) -> Self {
        JobRecommendation {
            job_id: job.job_id,
            title: job.title.clone(),
            company: job.employer.company_name.clone(),
            location: job.location.clone(),
            employment_type: job.employment_type.clone(),
            experience_level: job.experience_level,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            currency: job.currency.clone(),
            remote_allowed: job.remote_allowed,
            description: job.description.clone(),
            requirements: job.requirements.clone(),
            match_score: to_percent(result.overall_score),
            skills_match: to_percent(result.skills_match),
            experience_match: to_percent(result.experience_match),
            location_match: to_percent(result.location_match),
            salary_match: to_percent(result.salary_match),
            reasoning: result.reasoning,
            matched_skills: result.matched_skills,
            missing_skills: result.missing_skills,
            recommendations: result.recommendations,
            ai_confidence: result.ai_confidence,
            created_at: job.created_at,
            application_deadline: job.application_deadline,
            logo_url: job.employer.logo_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub skills: Vec<String>,
    pub experience_years: u32,
    pub location: Option<String>,
}

impl From<&CandidateProfile> for CandidateSummary {
    fn from(candidate: &CandidateProfile) -> Self {
        CandidateSummary {
            skills: candidate.skills.clone(),
            experience_years: candidate.experience_years,
            location: candidate.location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub jobs_analyzed: usize,
    pub recommendations_generated: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<JobRecommendation>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_profile: Option<CandidateSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_info: Option<ProcessingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub cached: bool,
    /// Seconds since the cached payload was computed; only set on cache hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age: Option<u64>,
}

impl RecommendationResponse {
    fn empty_catalog() -> Self {
        RecommendationResponse {
            recommendations: Vec::new(),
            total: 0,
            candidate_profile: None,
            processing_info: None,
            message: Some(NO_ACTIVE_JOBS_MESSAGE.to_string()),
            cached: false,
            cache_age: None,
        }
    }
}

/// Applies the default and clamps to 1..=MAX_ACTIVE_JOBS.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_ACTIVE_JOBS)
}

/// Stable sort by descending match score, then truncate.
fn rank(mut recommendations: Vec<JobRecommendation>, limit: usize) -> Vec<JobRecommendation> {
    recommendations.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    recommendations.truncate(limit);
    recommendations
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

pub struct RecommendationService {
    repository: Arc<dyn MatchingRepository>,
    analytics: Arc<dyn AnalyticsSink>,
    matcher: RemoteMatchClient,
    cache: Arc<RecommendationCache>,
    concurrency: usize,
}

impl RecommendationService {
    pub fn new(
        repository: Arc<dyn MatchingRepository>,
        analytics: Arc<dyn AnalyticsSink>,
        matcher: RemoteMatchClient,
        cache: Arc<RecommendationCache>,
        concurrency: usize,
    ) -> Self {
        Self {
            repository,
            analytics,
            matcher,
            cache,
            concurrency: concurrency.max(1),
        }
    }

    /// Returns up to `limit` ranked recommendations, from cache unless
    /// `force_refresh` is set. A forced refresh still writes the cache.
    pub async fn recommend(
        &self,
        candidate_id: Uuid,
        limit: usize,
        force_refresh: bool,
    ) -> Result<RecommendationResponse, AppError> {
        if !force_refresh {
            if let Some(hit) = self.cache.get(candidate_id, limit) {
                info!("Returning cached job recommendations for candidate {candidate_id}");
                let mut response = hit.payload;
                response.cached = true;
                response.cache_age = Some(hit.age.as_secs());
                return Ok(response);
            }
        }

        let candidate = self
            .repository
            .fetch_candidate(candidate_id)
            .await
            .map_err(orchestration_error)?
            .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;

        let jobs = self
            .repository
            .fetch_active_jobs(MAX_ACTIVE_JOBS, Utc::now())
            .await
            .map_err(orchestration_error)?;

        if jobs.is_empty() {
            info!("No active jobs to match for candidate {candidate_id}");
            return Ok(RecommendationResponse::empty_catalog());
        }

        // `buffered` keeps fetch order, which the stable sort relies on for ties.
        let pending: Vec<_> = jobs
            .iter()
            .map(|job| self.score_job(&candidate, job))
            .collect();
        let scored: Vec<JobRecommendation> = stream::iter(pending)
            .buffered(self.concurrency.min(jobs.len()))
            .collect()
            .await;

        let recommendations = rank(scored, limit);
        let response = RecommendationResponse {
            total: recommendations.len(),
            candidate_profile: Some(CandidateSummary::from(&candidate)),
            processing_info: Some(ProcessingInfo {
                jobs_analyzed: jobs.len(),
                recommendations_generated: recommendations.len(),
                timestamp: Utc::now(),
            }),
            recommendations,
            message: None,
            cached: false,
            cache_age: None,
        };

        self.cache.set(candidate_id, limit, response.clone());
        info!(
            "Generated and cached {} job recommendations for candidate {candidate_id} ({} jobs analyzed)",
            response.total,
            jobs.len()
        );
        debug!("Recommendation cache holds {} entries", self.cache.len());

        Ok(response)
    }

    /// Scores one job and records the match. A failed write is logged and the
    /// job stays in the results.
    async fn score_job(&self, candidate: &CandidateProfile, job: &JobPosting) -> JobRecommendation {
        let result = self.matcher.match_via_remote(candidate, job, true).await;

        let record = JobMatchRecord::new(candidate, job, &result, false);
        if let Err(e) = self.analytics.save_job_match(&record).await {
            error!("Failed to save job match for job {}: {e:#}", job.job_id);
        }

        JobRecommendation::new(job, result)
    }
}

fn orchestration_error(err: anyhow::Error) -> AppError {
    error!("Get job recommendations error: {err:#}");
    AppError::Recommendation(format!("{err:#}"))
}
