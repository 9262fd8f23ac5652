pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analytics::handlers as analytics;
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendations
        .route(
            "/api/v1/recommendations",
            get(matching::handle_get_recommendations),
        )
        .route(
            "/api/v1/recommendations/matches",
            get(matching::handle_get_matches),
        )
        // Analytics
        .route(
            "/api/v1/recommendations/interactions",
            post(analytics::handle_track_interaction),
        )
        .route(
            "/api/v1/recommendations/feedback",
            post(analytics::handle_submit_feedback),
        )
        .route(
            "/api/v1/recommendations/analytics",
            get(analytics::handle_get_analytics),
        )
        .with_state(state)
}
