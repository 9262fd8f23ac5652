//! Fixtures and in-memory collaborators shared by unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::analytics::AnalyticsSink;
use crate::matching::remote::{RemoteMatchError, RemoteScorer};
use crate::matching::scoring::MatchResult;
use crate::models::analytics::{
    AnalyticsFilter, FeedbackEvent, InteractionEvent, JobMatchRecord, JobMatchRow,
    RecommendationAnalytics,
};
use crate::models::candidate::CandidateProfile;
use crate::models::job::{EmployerInfo, JobPosting};
use crate::repository::MatchingRepository;

/// Candidate with the given skills and nothing else known.
pub fn candidate_with(skills: &[&str]) -> CandidateProfile {
    CandidateProfile {
        candidate_id: Uuid::new_v4(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        experience_years: 0,
        location: None,
        expected_salary: None,
        resume_analysis: None,
        work_history: Vec::new(),
    }
}

/// On-site posting with the given skill tags and no level or salary.
pub fn job_with(skills: &[&str]) -> JobPosting {
    JobPosting {
        job_id: Uuid::new_v4(),
        title: "Backend Engineer".to_string(),
        description: None,
        requirements: None,
        skills: skills.iter().map(|s| s.to_string()).collect(),
        experience_level: None,
        employment_type: Some("full_time".to_string()),
        location: None,
        remote_allowed: false,
        salary_min: None,
        salary_max: None,
        currency: None,
        employer: EmployerInfo {
            company_name: "Acme Corp".to_string(),
            logo_url: None,
            industry: Some("Software".to_string()),
        },
        created_at: Utc::now(),
        application_deadline: None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Repository
// ────────────────────────────────────────────────────────────────────────────

pub struct InMemoryRepository {
    candidates: Vec<CandidateProfile>,
    jobs: Vec<JobPosting>,
    fail_jobs: bool,
}

impl InMemoryRepository {
    pub fn new(candidates: Vec<CandidateProfile>, jobs: Vec<JobPosting>) -> Self {
        Self {
            candidates,
            jobs,
            fail_jobs: false,
        }
    }

    /// Job queries return an error.
    pub fn failing_jobs(mut self) -> Self {
        self.fail_jobs = true;
        self
    }

    fn check_jobs(&self) -> Result<()> {
        if self.fail_jobs {
            return Err(anyhow!("job catalog unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl MatchingRepository for InMemoryRepository {
    async fn fetch_candidate(&self, candidate_id: Uuid) -> Result<Option<CandidateProfile>> {
        Ok(self
            .candidates
            .iter()
            .find(|c| c.candidate_id == candidate_id)
            .cloned())
    }

    async fn candidate_exists(&self, candidate_id: Uuid) -> Result<bool> {
        Ok(self.candidates.iter().any(|c| c.candidate_id == candidate_id))
    }

    async fn list_candidates(&self, limit: usize) -> Result<Vec<CandidateProfile>> {
        Ok(self.candidates.iter().take(limit).cloned().collect())
    }

    async fn fetch_active_jobs(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<JobPosting>> {
        self.check_jobs()?;
        Ok(self
            .jobs
            .iter()
            .filter(|job| job.application_deadline.map_or(true, |d| d >= now))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_jobs(&self, job_ids: &[Uuid]) -> Result<Vec<JobPosting>> {
        self.check_jobs()?;
        Ok(self
            .jobs
            .iter()
            .filter(|job| job_ids.contains(&job.job_id))
            .cloned()
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Analytics sink
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    matches: Mutex<Vec<JobMatchRecord>>,
    interactions: Mutex<Vec<InteractionEvent>>,
    feedback: Mutex<Vec<FeedbackEvent>>,
    failing_job: Option<Uuid>,
    fail_all_matches: bool,
}

impl RecordingSink {
    /// Rejects match records for `job_id`.
    pub fn failing_for_job(job_id: Uuid) -> Self {
        Self {
            failing_job: Some(job_id),
            ..Self::default()
        }
    }

    /// Rejects every match record, as if the analytics store were down.
    pub fn failing_all_matches() -> Self {
        Self {
            fail_all_matches: true,
            ..Self::default()
        }
    }

    pub fn matches(&self) -> Vec<JobMatchRecord> {
        self.matches.lock().unwrap().clone()
    }

    pub fn interactions(&self) -> Vec<InteractionEvent> {
        self.interactions.lock().unwrap().clone()
    }

    pub fn feedback(&self) -> Vec<FeedbackEvent> {
        self.feedback.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalyticsSink for RecordingSink {
    async fn save_job_match(&self, record: &JobMatchRecord) -> Result<()> {
        if self.fail_all_matches || self.failing_job == Some(record.job_id) {
            return Err(anyhow!("insert into job_matches failed"));
        }
        self.matches.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn save_interaction(&self, event: &InteractionEvent) -> Result<()> {
        self.interactions.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn save_feedback(&self, event: &FeedbackEvent) -> Result<()> {
        self.feedback.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn job_matches(&self, candidate_id: Uuid, limit: usize) -> Result<Vec<JobMatchRow>> {
        let mut latest: BTreeMap<Uuid, JobMatchRecord> = BTreeMap::new();
        for record in self.matches() {
            if record.candidate_id != candidate_id {
                continue;
            }
            let newer = latest
                .get(&record.job_id)
                .map_or(true, |seen| record.calculated_at >= seen.calculated_at);
            if newer {
                latest.insert(record.job_id, record);
            }
        }

        let mut rows: Vec<JobMatchRow> = latest
            .into_values()
            .map(|record| {
                Ok(JobMatchRow {
                    id: Uuid::new_v4(),
                    candidate_id: record.candidate_id,
                    job_id: record.job_id,
                    match_score: record.match_score,
                    details: serde_json::to_value(&record.details)?,
                    background_calculated: record.background_calculated,
                    calculated_at: record.calculated_at,
                })
            })
            .collect::<Result<_, serde_json::Error>>()?;
        rows.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn recommendation_analytics(
        &self,
        filter: &AnalyticsFilter,
    ) -> Result<RecommendationAnalytics> {
        let mut report = RecommendationAnalytics::default();

        for event in self.interactions() {
            if in_window(filter, event.candidate_id, event.created_at) {
                report.total_interactions += 1;
                *report
                    .interactions_by_action
                    .entry(event.action.to_string())
                    .or_default() += 1;
            }
        }

        let ratings: Vec<f64> = self
            .feedback()
            .iter()
            .filter(|f| in_window(filter, f.candidate_id, f.submitted_at))
            .map(|f| f64::from(f.rating))
            .collect();
        report.feedback_count = ratings.len() as i64;
        report.average_rating = average(&ratings);

        let matches: Vec<JobMatchRecord> = self
            .matches()
            .into_iter()
            .filter(|m| in_window(filter, m.candidate_id, m.calculated_at))
            .collect();
        report.matches_computed = matches.len() as i64;
        report.background_matches = matches.iter().filter(|m| m.background_calculated).count() as i64;
        report.average_match_score =
            average(&matches.iter().map(|m| m.match_score).collect::<Vec<_>>());

        Ok(report)
    }
}

/// Inclusive date bounds plus the optional candidate, as the SQL report applies them.
pub fn in_window(filter: &AnalyticsFilter, candidate_id: Uuid, at: DateTime<Utc>) -> bool {
    at >= filter.start
        && at <= filter.end
        && filter.candidate_id.map_or(true, |id| id == candidate_id)
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Remote scorers
// ────────────────────────────────────────────────────────────────────────────

/// Always unavailable, as if the matching service were down.
pub struct FailingScorer;

#[async_trait]
impl RemoteScorer for FailingScorer {
    async fn score_remote(
        &self,
        _candidate: &CandidateProfile,
        _job: &JobPosting,
        _include_reasons: bool,
    ) -> Result<MatchResult, RemoteMatchError> {
        Err(RemoteMatchError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}

/// Answers every request with the same result.
pub struct StaticScorer(pub MatchResult);

#[async_trait]
impl RemoteScorer for StaticScorer {
    async fn score_remote(
        &self,
        _candidate: &CandidateProfile,
        _job: &JobPosting,
        _include_reasons: bool,
    ) -> Result<MatchResult, RemoteMatchError> {
        Ok(self.0.clone())
    }
}

/// Answers after `delay`, tracking how many calls are in flight at once.
pub struct CountingScorer {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingScorer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteScorer for CountingScorer {
    async fn score_remote(
        &self,
        candidate: &CandidateProfile,
        job: &JobPosting,
        _include_reasons: bool,
    ) -> Result<MatchResult, RemoteMatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(crate::matching::scoring::score(candidate, job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds_are_inclusive() {
        let now = Utc::now();
        let candidate = Uuid::new_v4();
        let filter = AnalyticsFilter {
            start: now - chrono::Duration::days(1),
            end: now,
            candidate_id: Some(candidate),
        };
        assert!(in_window(&filter, candidate, now));
        assert!(in_window(&filter, candidate, now - chrono::Duration::days(1)));
        assert!(!in_window(&filter, candidate, now + chrono::Duration::seconds(1)));
        assert!(!in_window(&filter, Uuid::new_v4(), now));
    }
}
