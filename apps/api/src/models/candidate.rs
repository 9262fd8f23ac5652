use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Normalised view of a job-seeker used as scoring input.
/// Assembled fresh per request; never persisted by the matching core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateProfile {
    pub candidate_id: Uuid,
    pub skills: Vec<String>,
    pub experience_years: u32,
    pub location: Option<String>,
    pub expected_salary: Option<f64>,
    /// Latest AI resume analysis, forwarded untouched to the remote scorer.
    pub resume_analysis: Option<Value>,
    /// CV roles, forwarded to the remote scorer.
    #[serde(default)]
    pub work_history: Vec<WorkPeriod>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub experience_years: Option<i32>,
    pub location: Option<String>,
    pub expected_salary: Option<f64>,
    pub skills: Vec<String>,
    pub resume_analysis: Option<Value>,
}

/// One role from the candidate's CV work history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkPeriod {
    #[serde(skip)]
    pub candidate_id: Uuid,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "current")]
    pub is_current: bool,
}

impl CandidateRow {
    /// Builds the scoring profile. A stored experience of zero falls back to
    /// the years derived from the CV work history.
    pub fn into_profile(self, history: &[WorkPeriod], today: NaiveDate) -> CandidateProfile {
        let stored = self.experience_years.unwrap_or(0).max(0) as u32;
        let experience_years = if stored == 0 && !history.is_empty() {
            experience_from_history(history, today)
        } else {
            stored
        };

        CandidateProfile {
            candidate_id: self.id,
            skills: self.skills,
            experience_years,
            location: self.location,
            expected_salary: self.expected_salary,
            resume_analysis: self.resume_analysis,
            work_history: history.to_vec(),
        }
    }
}

/// Sums whole months across all periods (current roles run to `today`) and
/// rounds to years. Periods with no end date that are not current count as zero.
pub fn experience_from_history(history: &[WorkPeriod], today: NaiveDate) -> u32 {
    let total_months: i64 = history
        .iter()
        .map(|period| {
            let end = if period.is_current {
                Some(today)
            } else {
                period.end_date
            };
            match end {
                Some(end) => months_between(period.start_date, end).max(0),
                None => 0,
            }
        })
        .sum();

    (total_months as f64 / 12.0).round() as u32
}

fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let years = (end.year() - start.year()) as i64;
    let months = end.month() as i64 - start.month() as i64;
    years * 12 + months
}
