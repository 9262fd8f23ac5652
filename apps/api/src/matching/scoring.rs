//! Scoring engine: the local heuristic that rates a candidate against a posting.
//!
//! Used inline whenever the remote scorer is unavailable and directly by the
//! background recalculator, so both paths share one formula.
//!
//! overall = min(0.5 + 0.4·skills + 0.3·experience + 0.2·location + 0.1·salary, 1.0)

use serde::{Deserialize, Serialize};

use crate::matching::skills::{display_skill, normalize_skills, required_skills};
use crate::models::candidate::CandidateProfile;
use crate::models::job::{ExperienceLevel, JobPosting};

pub const BASE_SCORE: f64 = 0.5;
pub const SKILLS_WEIGHT: f64 = 0.4;
pub const EXPERIENCE_WEIGHT: f64 = 0.3;
pub const LOCATION_WEIGHT: f64 = 0.2;
pub const SALARY_WEIGHT: f64 = 0.1;

/// Score used whenever a component has nothing to compare.
pub const NEUTRAL_SCORE: f64 = 0.5;
/// Non-remote postings whose location does not match, or is unknown.
pub const LOCATION_MISMATCH_SCORE: f64 = 0.3;
/// Confidence stamped on locally computed results.
pub const FALLBACK_CONFIDENCE: f64 = 0.7;

const MAX_SUGGESTED_SKILLS: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Output model (shared with the remote scorer's wire format)
// ────────────────────────────────────────────────────────────────────────────

/// Compatibility breakdown for one candidate/posting pair. All scores are 0.0 – 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub overall_score: f64,
    pub skills_match: f64,
    pub experience_match: f64,
    #[serde(default)]
    pub location_match: f64,
    #[serde(default)]
    pub salary_match: f64,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default = "remote_confidence")]
    pub ai_confidence: f64,
}

fn remote_confidence() -> f64 {
    1.0
}

/// Converts a 0.0 – 1.0 score into a whole percentage.
pub fn to_percent(score: f64) -> u32 {
    (score * 100.0).round().max(0.0) as u32
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Scores a candidate against a posting. Never fails: absent fields degrade
/// to the neutral default of their component. Deterministic for equal inputs.
pub fn score(candidate: &CandidateProfile, job: &JobPosting) -> MatchResult {
    let candidate_skills = normalize_skills(&candidate.skills);
    let job_skills = normalize_skills(&required_skills(job));

    let matched: Vec<&String> = candidate_skills
        .iter()
        .filter(|skill| job_skills.contains(skill))
        .collect();
    let missing: Vec<&String> = job_skills
        .iter()
        .filter(|skill| !candidate_skills.contains(skill))
        .collect();

    let skills_score = if job_skills.is_empty() {
        NEUTRAL_SCORE
    } else {
        matched.len() as f64 / job_skills.len() as f64
    };
    let experience_score = experience_score(candidate.experience_years, job.experience_level);
    let location_score = location_score(
        candidate.location.as_deref(),
        job.location.as_deref(),
        job.remote_allowed,
    );
    let salary_score = salary_score(candidate.expected_salary, job.salary_min, job.salary_max);

    let overall_score = (BASE_SCORE
        + skills_score * SKILLS_WEIGHT
        + experience_score * EXPERIENCE_WEIGHT
        + location_score * LOCATION_WEIGHT
        + salary_score * SALARY_WEIGHT)
        .min(1.0);

    let matched_skills: Vec<String> = matched.iter().map(|s| display_skill(s)).collect();
    let missing_skills: Vec<String> = missing.iter().map(|s| display_skill(s)).collect();

    let reasoning = format!(
        "Local match estimate: {}% overall from skills {}%, experience {}%, location {}% and salary {}%.",
        to_percent(overall_score),
        to_percent(skills_score),
        to_percent(experience_score),
        to_percent(location_score),
        to_percent(salary_score),
    );
    let recommendations = build_recommendations(&missing_skills);

    MatchResult {
        overall_score,
        skills_match: skills_score,
        experience_match: experience_score,
        location_match: location_score,
        salary_match: salary_score,
        matched_skills,
        missing_skills,
        reasoning,
        recommendations,
        ai_confidence: FALLBACK_CONFIDENCE,
    }
}

fn experience_score(years: u32, level: Option<ExperienceLevel>) -> f64 {
    match level {
        Some(ExperienceLevel::Entry) => 1.0,
        Some(ExperienceLevel::Mid) if years >= 2 => 1.0,
        Some(ExperienceLevel::Senior) if years >= 5 => 1.0,
        _ => NEUTRAL_SCORE,
    }
}

fn location_score(candidate: Option<&str>, job: Option<&str>, remote_allowed: bool) -> f64 {
    if remote_allowed {
        return 1.0;
    }

    let candidate = candidate.map(|l| l.trim().to_lowercase()).unwrap_or_default();
    let job = job.map(|l| l.trim().to_lowercase()).unwrap_or_default();

    if !candidate.is_empty()
        && !job.is_empty()
        && (candidate.contains(&job) || job.contains(&candidate))
    {
        1.0
    } else {
        LOCATION_MISMATCH_SCORE
    }
}

fn salary_score(expected: Option<f64>, min: Option<f64>, max: Option<f64>) -> f64 {
    match (expected, min, max) {
        (Some(expected), Some(min), Some(max)) if expected >= min && expected <= max => 1.0,
        _ => NEUTRAL_SCORE,
    }
}

fn build_recommendations(missing_skills: &[String]) -> Vec<String> {
    if missing_skills.is_empty() {
        return vec!["Great match! Consider applying.".to_string()];
    }

    let top: Vec<&str> = missing_skills
        .iter()
        .take(MAX_SUGGESTED_SKILLS)
        .map(String::as_str)
        .collect();
    vec![format!("Consider developing skills in: {}", top.join(", "))]
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
