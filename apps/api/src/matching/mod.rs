// Job matching core.
// Implements: local scoring engine, remote scorer with fallback, recommendation
// cache, the recommendation service and the periodic background recalculation.
// Only remote.rs talks to the AI matching service.

pub mod background;
pub mod cache;
pub mod handlers;
pub mod recommender;
pub mod remote;
pub mod scoring;
pub mod skills;

pub use background::{BackgroundRecalculator, RecalculatorConfig};
pub use cache::RecommendationCache;
pub use recommender::RecommendationService;
pub use remote::{HttpRemoteScorer, RemoteMatchClient};
