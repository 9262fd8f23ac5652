//! Interaction tracking and feedback collection. Payloads are validated
//! before anything is written; writes are appends.

use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::analytics::AnalyticsSink;
use crate::errors::AppError;
use crate::models::analytics::{FeedbackEvent, InteractionAction, InteractionEvent};

pub const RATING_RANGE: RangeInclusive<i16> = 1..=5;

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub candidate_id: Uuid,
    pub job_id: Option<Uuid>,
    pub action: Option<String>,
    pub match_score: Option<f64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub candidate_id: Uuid,
    pub job_id: Option<Uuid>,
    pub rating: Option<f64>,
    pub feedback: Option<String>,
    #[serde(default)]
    pub improvement_suggestions: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct InteractionAck {
    pub message: String,
    pub interaction_id: Uuid,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FeedbackAck {
    pub message: String,
    pub feedback_id: Uuid,
}

/// Rejects a missing rating, a fractional one, or one outside 1..=5.
pub fn validate_rating(rating: Option<f64>) -> Result<i16, AppError> {
    let rating =
        rating.ok_or_else(|| AppError::Validation("Job ID and rating are required".to_string()))?;
    let (min, max) = (*RATING_RANGE.start(), *RATING_RANGE.end());
    if rating.fract() != 0.0 || rating < f64::from(min) || rating > f64::from(max) {
        return Err(AppError::Validation(
            "Rating must be a whole number between 1 and 5".to_string(),
        ));
    }
    Ok(rating as i16)
}

fn require_job_id(job_id: Option<Uuid>, message: &str) -> Result<Uuid, AppError> {
    job_id.ok_or_else(|| AppError::Validation(message.to_string()))
}

#[derive(Clone)]
pub struct InteractionTracker {
    sink: Arc<dyn AnalyticsSink>,
}

impl InteractionTracker {
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self { sink }
    }

    pub async fn track(
        &self,
        request: InteractionRequest,
        user_agent: Option<String>,
    ) -> Result<InteractionAck, AppError> {
        const MISSING: &str = "Job ID and action are required";

        let job_id = require_job_id(request.job_id, MISSING)?;
        let action: InteractionAction = request
            .action
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| AppError::Validation(MISSING.to_string()))?
            .parse()
            .map_err(AppError::Validation)?;

        let event = InteractionEvent {
            id: Uuid::new_v4(),
            candidate_id: request.candidate_id,
            job_id,
            action,
            match_score: request.match_score,
            metadata: request.metadata,
            user_agent,
            created_at: Utc::now(),
        };
        self.sink.save_interaction(&event).await?;

        info!(
            "Tracked recommendation interaction: candidate {}, job {}, action {}",
            event.candidate_id, event.job_id, event.action
        );

        Ok(InteractionAck {
            message: "Interaction tracked successfully".to_string(),
            interaction_id: event.id,
        })
    }
}

#[derive(Clone)]
pub struct FeedbackCollector {
    sink: Arc<dyn AnalyticsSink>,
}

impl FeedbackCollector {
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self { sink }
    }

    /// Stores the feedback and a matching `feedback` interaction.
    pub async fn submit_feedback(&self, request: FeedbackRequest) -> Result<FeedbackAck, AppError> {
        let job_id = require_job_id(request.job_id, "Job ID and rating are required")?;
        let rating = validate_rating(request.rating)?;
        let feedback = request.feedback.unwrap_or_default();
        let now = Utc::now();

        let event = FeedbackEvent {
            id: Uuid::new_v4(),
            candidate_id: request.candidate_id,
            job_id,
            rating,
            feedback,
            improvement_suggestions: request.improvement_suggestions,
            processed: false,
            submitted_at: now,
        };
        self.sink.save_feedback(&event).await?;

        let mut metadata = Map::new();
        metadata.insert("rating".to_string(), json!(rating));
        metadata.insert(
            "has_text_feedback".to_string(),
            json!(!event.feedback.trim().is_empty()),
        );
        let interaction = InteractionEvent {
            id: Uuid::new_v4(),
            candidate_id: event.candidate_id,
            job_id,
            action: InteractionAction::Feedback,
            match_score: None,
            metadata,
            user_agent: None,
            created_at: now,
        };
        self.sink.save_interaction(&interaction).await?;

        info!(
            "Received recommendation feedback: candidate {}, job {}, rating {}",
            event.candidate_id, job_id, rating
        );

        Ok(FeedbackAck {
            message: "Feedback submitted successfully".to_string(),
            feedback_id: event.id,
        })
    }
}
