use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::matching::scoring::MatchResult;
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;

/// What a candidate did with a recommended job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionAction {
    View,
    Apply,
    Save,
    Dismiss,
    Feedback,
}

impl InteractionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionAction::View => "view",
            InteractionAction::Apply => "apply",
            InteractionAction::Save => "save",
            InteractionAction::Dismiss => "dismiss",
            InteractionAction::Feedback => "feedback",
        }
    }
}

impl fmt::Display for InteractionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "view" => Ok(InteractionAction::View),
            "apply" => Ok(InteractionAction::Apply),
            "save" => Ok(InteractionAction::Save),
            "dismiss" => Ok(InteractionAction::Dismiss),
            "feedback" => Ok(InteractionAction::Feedback),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}

/// Append-only record of a candidate interacting with a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionEvent {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub action: InteractionAction,
    pub match_score: Option<f64>,
    pub metadata: Map<String, Value>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only rating of a recommendation. `rating` is always within 1..=5.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackEvent {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub rating: i16,
    pub feedback: String,
    pub improvement_suggestions: Vec<String>,
    pub processed: bool,
    pub submitted_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Persisted match breakdown
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillsBreakdown {
    pub score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperienceBreakdown {
    pub score: f64,
    pub candidate_experience: u32,
    pub job_requirement: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationBreakdown {
    pub score: f64,
    pub candidate_location: Option<String>,
    pub job_location: Option<String>,
    pub remote_allowed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalaryBreakdown {
    pub score: f64,
    pub candidate_expectation: Option<f64>,
    pub job_min: Option<f64>,
    pub job_max: Option<f64>,
}

/// Stored as JSONB next to the headline score. Component scores are 0 – 100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchBreakdown {
    pub skills_match: SkillsBreakdown,
    pub experience_match: ExperienceBreakdown,
    pub location_match: LocationBreakdown,
    pub salary_match: SalaryBreakdown,
    pub reasoning: String,
    pub recommendations: Vec<String>,
    pub ai_confidence: f64,
}

/// One scored candidate/job pair written to the analytics store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobMatchRecord {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    /// 0 – 100
    pub match_score: f64,
    pub details: MatchBreakdown,
    pub background_calculated: bool,
    pub calculated_at: DateTime<Utc>,
}

impl JobMatchRecord {
    pub fn new(
        candidate: &CandidateProfile,
        job: &JobPosting,
        result: &MatchResult,
        background_calculated: bool,
    ) -> Self {
        JobMatchRecord {
            candidate_id: candidate.candidate_id,
            job_id: job.job_id,
            match_score: result.overall_score * 100.0,
            details: MatchBreakdown {
                skills_match: SkillsBreakdown {
                    score: result.skills_match * 100.0,
                    matched_skills: result.matched_skills.clone(),
                    missing_skills: result.missing_skills.clone(),
                },
                experience_match: ExperienceBreakdown {
                    score: result.experience_match * 100.0,
                    candidate_experience: candidate.experience_years,
                    job_requirement: job.experience_level.map(|l| l.to_string()),
                },
                location_match: LocationBreakdown {
                    score: result.location_match * 100.0,
                    candidate_location: candidate.location.clone(),
                    job_location: job.location.clone(),
                    remote_allowed: job.remote_allowed,
                },
                salary_match: SalaryBreakdown {
                    score: result.salary_match * 100.0,
                    candidate_expectation: candidate.expected_salary,
                    job_min: job.salary_min,
                    job_max: job.salary_max,
                },
                reasoning: result.reasoning.clone(),
                recommendations: result.recommendations.clone(),
                ai_confidence: result.ai_confidence,
            },
            background_calculated,
            calculated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobMatchRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub match_score: f64,
    pub details: Value,
    pub background_calculated: bool,
    pub calculated_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Reporting
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsFilter {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub candidate_id: Option<Uuid>,
}

/// Aggregate recommendation statistics for the admin report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecommendationAnalytics {
    pub total_interactions: i64,
    pub interactions_by_action: BTreeMap<String, i64>,
    pub feedback_count: i64,
    pub average_rating: Option<f64>,
    pub matches_computed: i64,
    pub background_matches: i64,
    pub average_match_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scoring;
    use crate::testing::{candidate_with, job_with};

    #[test]
    fn test_action_round_trips_through_str() {
        for action in [
            InteractionAction::View,
            InteractionAction::Apply,
            InteractionAction::Save,
            InteractionAction::Dismiss,
            InteractionAction::Feedback,
        ] {
            assert_eq!(action.as_str().parse::<InteractionAction>(), Ok(action));
        }
        assert!("share".parse::<InteractionAction>().is_err());
    }

    #[test]
    fn test_match_record_scales_scores_to_percent() {
        let candidate = candidate_with(&["Rust"]);
        let job = job_with(&["Rust", "Go"]);
        let result = scoring::score(&candidate, &job);
        let record = JobMatchRecord::new(&candidate, &job, &result, true);

        assert_eq!(record.match_score, result.overall_score * 100.0);
        assert_eq!(record.details.skills_match.score, 50.0);
        assert_eq!(record.details.skills_match.missing_skills, vec!["Go"]);
        assert!(record.background_calculated);
        assert_eq!(record.job_id, job.job_id);
    }
}
