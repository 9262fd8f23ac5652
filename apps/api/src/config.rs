use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::matching::background::DEFAULT_RECALCULATION_INTERVAL;
use crate::matching::recommender::DEFAULT_MATCH_CONCURRENCY;
use crate::matching::remote::DEFAULT_REMOTE_TIMEOUT;

const DEFAULT_MATCHING_SERVICE_URL: &str = "http://localhost:5001";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Base URL of the AI matching service.
    pub matching_service_url: String,
    pub remote_match_timeout: Duration,
    /// Concurrent remote scoring calls per recommendation request.
    pub match_concurrency: usize,
    pub background_matching_enabled: bool,
    pub background_matching_interval: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Config {
            database_url: lookup("DATABASE_URL").with_context(|| {
                "Required environment variable 'DATABASE_URL' is not set".to_string()
            })?,
            matching_service_url: lookup("MATCHING_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_MATCHING_SERVICE_URL.to_string()),
            remote_match_timeout: parse_or(&lookup, "REMOTE_MATCH_TIMEOUT_SECS", DEFAULT_REMOTE_TIMEOUT.as_secs())
                .map(Duration::from_secs)?,
            match_concurrency: parse_or(&lookup, "MATCH_CONCURRENCY", DEFAULT_MATCH_CONCURRENCY)?,
            background_matching_enabled: parse_or(&lookup, "BACKGROUND_MATCHING_ENABLED", true)?,
            background_matching_interval: parse_or(
                &lookup,
                "BACKGROUND_MATCHING_INTERVAL_SECS",
                DEFAULT_RECALCULATION_INTERVAL.as_secs(),
            )
            .map(Duration::from_secs)?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
