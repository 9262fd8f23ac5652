use std::sync::Arc;

use crate::analytics::{AnalyticsSink, FeedbackCollector, InteractionTracker};
use crate::config::Config;
use crate::matching::recommender::RecommendationService;
use crate::repository::MatchingRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub recommender: Arc<RecommendationService>,
    pub tracker: InteractionTracker,
    pub feedback: FeedbackCollector,
    /// Read-side access used by the stored-matches listing.
    pub repository: Arc<dyn MatchingRepository>,
    pub analytics: Arc<dyn AnalyticsSink>,
}
