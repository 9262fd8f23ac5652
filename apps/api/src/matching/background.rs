//! Periodic warm-up of stored job matches.
//!
//! Every interval a small batch of candidates is scored against the newest
//! active jobs with the local engine and written to the analytics sink. The
//! live recommendation cache is only read, to skip candidates that already
//! have fresh results.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::analytics::AnalyticsSink;
use crate::matching::cache::RecommendationCache;
use crate::matching::recommender::DEFAULT_LIMIT;
use crate::matching::scoring;
use crate::models::analytics::JobMatchRecord;
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;
use crate::repository::MatchingRepository;

pub const DEFAULT_RECALCULATION_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug, Clone)]
pub struct RecalculatorConfig {
    pub interval: Duration,
    pub max_candidates: usize,
    pub max_jobs: usize,
    pub jobs_per_candidate: usize,
    /// Pause after each processed candidate.
    pub candidate_delay: Duration,
    /// Cache key limit probed to decide whether a candidate is already fresh.
    pub fresh_limit: usize,
}

impl Default for RecalculatorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RECALCULATION_INTERVAL,
            max_candidates: 10,
            max_jobs: 20,
            jobs_per_candidate: 5,
            candidate_delay: Duration::from_millis(100),
            fresh_limit: DEFAULT_LIMIT,
        }
    }
}

impl RecalculatorConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Outcome of one batch, logged at the end of each run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalculationSummary {
    pub candidates_processed: usize,
    pub candidates_skipped: usize,
    pub matches_saved: usize,
    pub failures: usize,
}

/// Handle returned by [`BackgroundRecalculator::start`].
pub struct RecalculatorHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RecalculatorHandle {
    /// Stops scheduling new runs and waits for an in-flight run to finish.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        // The task may already be gone; joining below reports that.
        let _ = self.shutdown_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

pub struct BackgroundRecalculator {
    repository: Arc<dyn MatchingRepository>,
    analytics: Arc<dyn AnalyticsSink>,
    cache: Arc<RecommendationCache>,
    config: RecalculatorConfig,
}

impl BackgroundRecalculator {
    pub fn new(
        repository: Arc<dyn MatchingRepository>,
        analytics: Arc<dyn AnalyticsSink>,
        cache: Arc<RecommendationCache>,
        config: RecalculatorConfig,
    ) -> Self {
        Self {
            repository,
            analytics,
            cache,
            config,
        }
    }

    /// Spawns the schedule. The first run happens one interval after start.
    pub fn start(self) -> RecalculatorHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        info!(
            "Starting background match recalculation every {:?}",
            self.config.interval
        );
        let task = tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        RecalculatorHandle { shutdown_tx, task }
    }

    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        let mut ticker = interval_at(Instant::now() + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Shutdown wins over a tick that fell due during the last batch.
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Background match recalculation received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {}
            }

            // Outside the select so shutdown waits for the batch.
            let summary = self.run_once().await;
            info!(
                "Background job matching completed. Processed {} candidates ({} skipped, {} matches saved, {} failures)",
                summary.candidates_processed,
                summary.candidates_skipped,
                summary.matches_saved,
                summary.failures
            );
        }
    }

    /// One batch. Never fails; every error is logged and counted.
    pub async fn run_once(&self) -> RecalculationSummary {
        let mut summary = RecalculationSummary::default();

        let candidates = match self.repository.list_candidates(self.config.max_candidates).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Background job matching failed to load candidates: {e:#}");
                summary.failures += 1;
                return summary;
            }
        };
        let jobs = match self
            .repository
            .fetch_active_jobs(self.config.max_jobs, Utc::now())
            .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                error!("Background job matching failed to load jobs: {e:#}");
                summary.failures += 1;
                return summary;
            }
        };

        if candidates.is_empty() || jobs.is_empty() {
            debug!(
                "Background job matching has nothing to do ({} candidates, {} jobs)",
                candidates.len(),
                jobs.len()
            );
            return summary;
        }

        let batch = &jobs[..jobs.len().min(self.config.jobs_per_candidate)];
        for candidate in &candidates {
            if self
                .cache
                .is_fresh(candidate.candidate_id, self.config.fresh_limit)
            {
                debug!(
                    "Skipping candidate {}: recommendations are fresh",
                    candidate.candidate_id
                );
                summary.candidates_skipped += 1;
                continue;
            }

            self.score_candidate(candidate, batch, &mut summary).await;
            summary.candidates_processed += 1;

            tokio::time::sleep(self.config.candidate_delay).await;
        }

        summary
    }

    async fn score_candidate(
        &self,
        candidate: &CandidateProfile,
        jobs: &[JobPosting],
        summary: &mut RecalculationSummary,
    ) {
        for job in jobs {
            let result = scoring::score(candidate, job);
            let record = JobMatchRecord::new(candidate, job, &result, true);
            match self.analytics.save_job_match(&record).await {
                Ok(()) => summary.matches_saved += 1,
                Err(e) => {
                    warn!(
                        "Background matching error for candidate {} job {}: {e:#}",
                        candidate.candidate_id, job.job_id
                    );
                    summary.failures += 1;
                }
            }
        }
    }
}
