//! Worker configuration from environment variables.

use std::time::Duration;

use anyhow::Context;

/// Runtime configuration for the sequence worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub delivery_api_url: String,
    pub delivery_api_key: String,
    pub batch_size: i64,
    pub poll_interval: Duration,
    pub delivery_timeout: Duration,
}

/// Default seconds between batch runs.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 3600;

/// Default bound on a single delivery call.
const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 30;

impl WorkerConfig {
    /// Load configuration from the environment (after `dotenvy` has run).
    ///
    /// `DATABASE_URL`, `DELIVERY_API_URL`, and `DELIVERY_API_KEY` are
    /// required; the rest fall back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
            delivery_api_url: std::env::var("DELIVERY_API_URL")
                .context("DELIVERY_API_URL is not set")?,
            delivery_api_key: std::env::var("DELIVERY_API_KEY")
                .context("DELIVERY_API_KEY is not set")?,
            batch_size: parse_env(
                "SEQUENCE_BATCH_SIZE",
                cadence_db::repositories::enrollment_repo::DEFAULT_BATCH_SIZE,
            )?,
            poll_interval: Duration::from_secs(parse_env(
                "SEQUENCE_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )?),
            delivery_timeout: Duration::from_secs(parse_env(
                "DELIVERY_TIMEOUT_SECS",
                DEFAULT_DELIVERY_TIMEOUT_SECS,
            )?),
        })
    }
}

/// Read an optional env var, falling back to `default` when unset.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
