//! Time-boxed cache of computed recommendation sets, keyed by (candidate, limit).
//!
//! Entries expire after the TTL and are dropped lazily on the next read. When
//! an insert pushes the size past the ceiling, the earliest-inserted key is
//! evicted (FIFO, not recency of access). Overwriting a key keeps its original
//! insertion position.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::matching::recommender::RecommendationResponse;

pub const RECOMMENDATION_TTL: Duration = Duration::from_secs(30 * 60);
pub const MAX_CACHE_ENTRIES: usize = 100;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: RECOMMENDATION_TTL,
            max_entries: MAX_CACHE_ENTRIES,
        }
    }
}

type CacheKey = (Uuid, usize);

#[derive(Debug)]
struct CacheEntry<V> {
    payload: V,
    created_at: Instant,
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    insertion_order: VecDeque<CacheKey>,
}

/// A cache hit: the stored payload and how long ago it was computed.
#[derive(Debug, Clone)]
pub struct CachedRecommendations<V> {
    pub payload: V,
    pub age: Duration,
}

/// Shared across concurrent requests. One mutex guards every
/// read-check-write sequence; it is never held across an await.
#[derive(Debug)]
pub struct RecommendationCache<V = RecommendationResponse> {
    config: CacheConfig,
    state: Mutex<CacheState<V>>,
}

impl<V: Clone> RecommendationCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
        }
    }

    /// Returns the entry if present and younger than the TTL. An expired entry
    /// is removed by this call.
    pub fn get(&self, candidate_id: Uuid, limit: usize) -> Option<CachedRecommendations<V>> {
        let key = (candidate_id, limit);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let age = state.entries.get(&key)?.created_at.elapsed();
        if age >= self.config.ttl {
            state.entries.remove(&key);
            state.insertion_order.retain(|k| k != &key);
            debug!("Recommendation cache entry for {candidate_id}/{limit} expired");
            return None;
        }

        state.entries.get(&key).map(|entry| CachedRecommendations {
            payload: entry.payload.clone(),
            age,
        })
    }

    /// Inserts or overwrites, then evicts the oldest-inserted key if the
    /// ceiling is exceeded.
    pub fn set(&self, candidate_id: Uuid, limit: usize, payload: V) {
        let key = (candidate_id, limit);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let entry = CacheEntry {
            payload,
            created_at: Instant::now(),
        };
        if state.entries.insert(key, entry).is_none() {
            state.insertion_order.push_back(key);
        }

        if state.entries.len() > self.config.max_entries {
            if let Some(oldest) = state.insertion_order.pop_front() {
                state.entries.remove(&oldest);
                debug!(
                    "Recommendation cache full, evicted entry for {}/{}",
                    oldest.0, oldest.1
                );
            }
        }
    }

    /// True when a non-expired entry exists. Does not touch expired entries.
    pub fn is_fresh(&self, candidate_id: Uuid, limit: usize) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .entries
            .get(&(candidate_id, limit))
            .is_some_and(|entry| entry.created_at.elapsed() < self.config.ttl)
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

impl<V: Clone> Default for RecommendationCache<V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
