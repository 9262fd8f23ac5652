use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::analytics::tracker::{FeedbackAck, FeedbackRequest, InteractionAck, InteractionRequest};
use crate::errors::AppError;
use crate::models::analytics::{AnalyticsFilter, RecommendationAnalytics};
use crate::state::AppState;

const DEFAULT_ANALYTICS_WINDOW_DAYS: i64 = 30;

/// POST /api/v1/recommendations/interactions
pub async fn handle_track_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<InteractionRequest>,
) -> Result<Json<InteractionAck>, AppError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let ack = state.tracker.track(req, user_agent).await?;
    Ok(Json(ack))
}

/// POST /api/v1/recommendations/feedback
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackAck>, AppError> {
    let ack = state.feedback.submit_feedback(req).await?;
    Ok(Json(ack))
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub candidate_id: Option<Uuid>,
}

impl AnalyticsQuery {
    /// Missing bounds default to the last 30 days ending now.
    fn into_filter(self, now: DateTime<Utc>) -> Result<AnalyticsFilter, AppError> {
        let end = self.end_date.unwrap_or(now);
        let start = self
            .start_date
            .unwrap_or(end - Duration::days(DEFAULT_ANALYTICS_WINDOW_DAYS));
        if start > end {
            return Err(AppError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }
        Ok(AnalyticsFilter {
            start,
            end,
            candidate_id: self.candidate_id,
        })
    }
}

/// GET /api/v1/recommendations/analytics
pub async fn handle_get_analytics(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<RecommendationAnalytics>, AppError> {
    let filter = params.into_filter(Utc::now())?;
    let report = state.analytics.recommendation_analytics(&filter).await?;
    Ok(Json(report))
}
