mod analytics;
mod config;
mod db;
mod errors;
mod matching;
mod models;
mod repository;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analytics::{AnalyticsSink, FeedbackCollector, InteractionTracker, PgAnalyticsStore};
use crate::config::Config;
use crate::db::create_pool;
use crate::matching::{
    BackgroundRecalculator, HttpRemoteScorer, RecalculatorConfig, RecommendationCache,
    RecommendationService, RemoteMatchClient,
};
use crate::repository::{MatchingRepository, PgMatchingRepository};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Arc::new(Config::from_env()?);

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recruit API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let repository: Arc<dyn MatchingRepository> = Arc::new(PgMatchingRepository::new(db.clone()));
    let analytics: Arc<dyn AnalyticsSink> = Arc::new(PgAnalyticsStore::new(db));

    // Remote matching service, with local scoring as fallback
    let scorer = HttpRemoteScorer::new(&config.matching_service_url, config.remote_match_timeout)?;
    info!(
        "Matching service client initialized ({}, timeout {:?})",
        config.matching_service_url, config.remote_match_timeout
    );

    let cache = Arc::new(RecommendationCache::default());
    let recommender = RecommendationService::new(
        repository.clone(),
        analytics.clone(),
        RemoteMatchClient::new(Arc::new(scorer)),
        cache.clone(),
        config.match_concurrency,
    );

    let recalculator = config.background_matching_enabled.then(|| {
        BackgroundRecalculator::new(
            repository.clone(),
            analytics.clone(),
            cache.clone(),
            RecalculatorConfig::default().with_interval(config.background_matching_interval),
        )
        .start()
    });

    // Build app state
    let state = AppState {
        config: config.clone(),
        recommender: Arc::new(recommender),
        tracker: InteractionTracker::new(analytics.clone()),
        feedback: FeedbackCollector::new(analytics.clone()),
        repository,
        analytics,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = recalculator {
        handle.shutdown().await?;
    }
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
