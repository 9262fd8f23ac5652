//! Remote match client. Asks the external AI matching service to score a
//! candidate/posting pair and substitutes the local scoring engine whenever
//! that service cannot answer.
//!
//! One attempt per job, no retry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::matching::scoring::{self, MatchResult};
use crate::matching::skills::required_skills;
use crate::models::candidate::{CandidateProfile, WorkPeriod};
use crate::models::job::JobPosting;

const CV_TO_JOB_PATH: &str = "/api/match/cv-to-job";
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RemoteMatchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("matching service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("matching service timed out after {0:?}")]
    Timeout(Duration),
}

/// An external scorer. Implementations make exactly one attempt.
#[async_trait]
pub trait RemoteScorer: Send + Sync {
    async fn score_remote(
        &self,
        candidate: &CandidateProfile,
        job: &JobPosting,
        include_reasons: bool,
    ) -> Result<MatchResult, RemoteMatchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CvToJobRequest<'a> {
    candidate_profile: CandidatePayload<'a>,
    job_data: JobPayload<'a>,
    include_reasons: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CandidatePayload<'a> {
    candidate_id: Uuid,
    skills: &'a [String],
    experience: u32,
    location: Option<&'a str>,
    expected_salary: Option<f64>,
    cv_analysis: Option<&'a Value>,
    work_experience: &'a [WorkPeriod],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobPayload<'a> {
    job_id: Uuid,
    title: &'a str,
    description: Option<&'a str>,
    requirements: Option<&'a str>,
    required_skills: Vec<String>,
    experience_level: Option<&'static str>,
    location: Option<&'a str>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    remote_allowed: bool,
    company: &'a str,
    industry: Option<&'a str>,
}

impl<'a> CvToJobRequest<'a> {
    fn new(candidate: &'a CandidateProfile, job: &'a JobPosting, include_reasons: bool) -> Self {
        Self {
            candidate_profile: CandidatePayload {
                candidate_id: candidate.candidate_id,
                skills: &candidate.skills,
                experience: candidate.experience_years,
                location: candidate.location.as_deref(),
                expected_salary: candidate.expected_salary,
                cv_analysis: candidate.resume_analysis.as_ref(),
                work_experience: &candidate.work_history,
            },
            job_data: JobPayload {
                job_id: job.job_id,
                title: &job.title,
                description: job.description.as_deref(),
                requirements: job.requirements.as_deref(),
                required_skills: required_skills(job),
                experience_level: job.experience_level.map(|level| level.as_str()),
                location: job.location.as_deref(),
                salary_min: job.salary_min,
                salary_max: job.salary_max,
                remote_allowed: job.remote_allowed,
                company: &job.employer.company_name,
                industry: job.employer.industry.as_deref(),
            },
            include_reasons,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP scorer
// ────────────────────────────────────────────────────────────────────────────

/// reqwest-backed scorer for the AI matching service.
#[derive(Clone)]
pub struct HttpRemoteScorer {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpRemoteScorer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteMatchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CV_TO_JOB_PATH),
            timeout,
        })
    }
}

#[async_trait]
impl RemoteScorer for HttpRemoteScorer {
    async fn score_remote(
        &self,
        candidate: &CandidateProfile,
        job: &JobPosting,
        include_reasons: bool,
    ) -> Result<MatchResult, RemoteMatchError> {
        let body = CvToJobRequest::new(candidate, job, include_reasons);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteMatchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: MatchResult = response.json().await.map_err(|e| self.classify(e))?;
        debug!(
            "Remote match for job {}: overall={:.2}",
            job.job_id, result.overall_score
        );
        Ok(result)
    }
}

impl HttpRemoteScorer {
    fn classify(&self, err: reqwest::Error) -> RemoteMatchError {
        if err.is_timeout() {
            RemoteMatchError::Timeout(self.timeout)
        } else {
            RemoteMatchError::Http(err)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client with fallback
// ────────────────────────────────────────────────────────────────────────────

/// Remote scoring with local fallback. Callers always get a `MatchResult`.
#[derive(Clone)]
pub struct RemoteMatchClient {
    scorer: Arc<dyn RemoteScorer>,
}

impl RemoteMatchClient {
    pub fn new(scorer: Arc<dyn RemoteScorer>) -> Self {
        Self { scorer }
    }

    /// Scores via the remote service; any failure is logged and replaced by
    /// `scoring::score` for the same inputs.
    pub async fn match_via_remote(
        &self,
        candidate: &CandidateProfile,
        job: &JobPosting,
        include_reasons: bool,
    ) -> MatchResult {
        match self
            .scorer
            .score_remote(candidate, job, include_reasons)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "AI matching service unavailable for job {}, using fallback scoring: {e}",
                    job.job_id
                );
                scoring::score(candidate, job)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scoring::FALLBACK_CONFIDENCE;
    use crate::testing::{candidate_with, job_with, FailingScorer, StaticScorer};
    use axum::{http::StatusCode, routing::post, Json, Router};

    /// Serves `router` on an ephemeral local port and returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn remote_result() -> MatchResult {
        MatchResult {
            overall_score: 0.91,
            skills_match: 0.8,
            experience_match: 1.0,
            location_match: 1.0,
            salary_match: 0.5,
            matched_skills: vec!["Rust".to_string()],
            missing_skills: vec![],
            reasoning: "Strong systems background".to_string(),
            recommendations: vec![],
            ai_confidence: 0.95,
        }
    }

    #[tokio::test]
    async fn test_remote_success_is_returned_untouched() {
        let client = RemoteMatchClient::new(Arc::new(StaticScorer(remote_result())));
        let result = client
            .match_via_remote(&candidate_with(&["Rust"]), &job_with(&["Rust"]), true)
            .await;
        assert_eq!(result, remote_result());
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_local_engine() {
        let candidate = candidate_with(&["Rust"]);
        let job = job_with(&["Rust", "Go"]);
        let client = RemoteMatchClient::new(Arc::new(FailingScorer));

        let result = client.match_via_remote(&candidate, &job, true).await;
        assert_eq!(result, scoring::score(&candidate, &job));
        assert_eq!(result.ai_confidence, FALLBACK_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_http_scorer_posts_camel_case_payload() {
        let router = Router::new().route(
            CV_TO_JOB_PATH,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["includeReasons"], true);
                assert_eq!(body["candidateProfile"]["skills"][0], "Rust");
                assert_eq!(body["jobData"]["requiredSkills"][0], "Rust");
                assert_eq!(body["jobData"]["company"], "Acme Corp");
                Json(serde_json::json!({
                    "overallScore": 0.88,
                    "skillsMatch": 1.0,
                    "experienceMatch": 0.5,
                    "reasoning": "ok",
                    "aiConfidence": 0.9
                }))
            }),
        );
        let base = serve(router).await;
        let scorer = HttpRemoteScorer::new(&base, Duration::from_secs(5)).unwrap();

        let result = scorer
            .score_remote(&candidate_with(&["Rust"]), &job_with(&["Rust"]), true)
            .await
            .unwrap();
        assert_eq!(result.overall_score, 0.88);
        assert_eq!(result.location_match, 0.0);
        assert_eq!(result.ai_confidence, 0.9);
    }

    #[tokio::test]
    async fn test_http_scorer_forwards_work_history() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Value>();
        let router = Router::new().route(
            CV_TO_JOB_PATH,
            post(move |Json(body): Json<Value>| async move {
                let _ = tx.send(body);
                Json(serde_json::json!({
                    "overallScore": 0.5,
                    "skillsMatch": 0.5,
                    "experienceMatch": 0.5
                }))
            }),
        );
        let base = serve(router).await;
        let scorer = HttpRemoteScorer::new(&base, Duration::from_secs(5)).unwrap();

        let mut candidate = candidate_with(&["Rust"]);
        candidate.work_history = vec![WorkPeriod {
            candidate_id: candidate.candidate_id,
            job_title: Some("Platform Engineer".to_string()),
            company: Some("Initech".to_string()),
            start_date: chrono::NaiveDate::from_ymd_opt(2019, 3, 1).unwrap(),
            end_date: None,
            is_current: true,
        }];
        scorer
            .score_remote(&candidate, &job_with(&["Rust"]), false)
            .await
            .unwrap();

        let body = rx.recv().await.unwrap();
        let roles = &body["candidateProfile"]["workExperience"];
        assert_eq!(roles.as_array().unwrap().len(), 1);
        assert_eq!(roles[0]["jobTitle"], "Platform Engineer");
        assert_eq!(roles[0]["company"], "Initech");
        assert_eq!(roles[0]["startDate"], "2019-03-01");
        assert_eq!(roles[0]["current"], true);
        assert!(roles[0].get("candidateId").is_none());
    }

    #[tokio::test]
    async fn test_http_scorer_non_2xx_is_error() {
        let router = Router::new().route(
            CV_TO_JOB_PATH,
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let base = serve(router).await;
        let scorer = HttpRemoteScorer::new(&base, Duration::from_secs(5)).unwrap();

        let err = scorer
            .score_remote(&candidate_with(&[]), &job_with(&[]), false)
            .await
            .unwrap_err();
        match err {
            RemoteMatchError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_http_scorer_times_out() {
        let router = Router::new().route(
            CV_TO_JOB_PATH,
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );
        let base = serve(router).await;
        let scorer = HttpRemoteScorer::new(&base, Duration::from_millis(100)).unwrap();

        let err = scorer
            .score_remote(&candidate_with(&[]), &job_with(&[]), false)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteMatchError::Timeout(_)), "{err}");
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let scorer = HttpRemoteScorer::new(&format!("http://{addr}"), Duration::from_secs(1)).unwrap();
        let client = RemoteMatchClient::new(Arc::new(scorer));
        let result = client
            .match_via_remote(&candidate_with(&["Rust"]), &job_with(&["Rust"]), true)
            .await;
        assert_eq!(result.ai_confidence, FALLBACK_CONFIDENCE);
    }
}
