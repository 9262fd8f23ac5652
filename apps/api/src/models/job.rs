use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Ordered seniority tiers a posting can declare.
/// Only entry, mid and senior carry explicit scoring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Junior,
    Mid,
    Senior,
    Lead,
    Executive,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
            ExperienceLevel::Executive => "executive",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" => Ok(ExperienceLevel::Entry),
            "junior" => Ok(ExperienceLevel::Junior),
            "mid" => Ok(ExperienceLevel::Mid),
            "senior" => Ok(ExperienceLevel::Senior),
            "lead" => Ok(ExperienceLevel::Lead),
            "executive" => Ok(ExperienceLevel::Executive),
            other => Err(format!("unknown experience level '{other}'")),
        }
    }
}

/// Employer fields denormalised onto each recommendation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmployerInfo {
    pub company_name: String,
    pub logo_url: Option<String>,
    pub industry: Option<String>,
}

/// Read-only snapshot of an active listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobPosting {
    pub job_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    /// Explicit skill tags. May be empty; see `matching::skills::required_skills`.
    pub skills: Vec<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub employment_type: Option<String>,
    pub location: Option<String>,
    pub remote_allowed: bool,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub currency: Option<String>,
    pub employer: EmployerInfo,
    pub created_at: DateTime<Utc>,
    pub application_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub skills: Vec<String>,
    pub experience_level: Option<String>,
    pub employment_type: Option<String>,
    pub location: Option<String>,
    pub remote_allowed: bool,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub currency: Option<String>,
    pub company_name: String,
    pub logo_url: Option<String>,
    pub industry: Option<String>,
    pub created_at: DateTime<Utc>,
    pub application_deadline: Option<DateTime<Utc>>,
}

impl From<JobRow> for JobPosting {
    fn from(row: JobRow) -> Self {
        // Unrecognised tiers score neutrally, so they are dropped rather than rejected.
        let experience_level = row
            .experience_level
            .as_deref()
            .and_then(|level| level.parse().ok());

        JobPosting {
            job_id: row.id,
            title: row.title,
            description: row.description,
            requirements: row.requirements,
            skills: row.skills,
            experience_level,
            employment_type: row.employment_type,
            location: row.location,
            remote_allowed: row.remote_allowed,
            salary_min: row.salary_min,
            salary_max: row.salary_max,
            currency: row.currency,
            employer: EmployerInfo {
                company_name: row.company_name,
                logo_url: row.logo_url,
                industry: row.industry,
            },
            created_at: row.created_at,
            application_deadline: row.application_deadline,
        }
    }
}
