//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing or
//! malformed. The database URL is wrapped in secrecy::SecretString so it
//! never lands in logs.

pub mod scoring;

pub use scoring::ScoringConfig;

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    pub store: StoreConfig,
    pub scoring: ScoringConfig,
}

/// Connection pool and per-transaction limits.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub max_connections: u32,
    /// How long a caller waits for a pooled connection.
    pub acquire_timeout: Duration,
    /// `SET LOCAL statement_timeout` for every engine transaction.
    pub statement_timeout: Duration,
    /// `SET LOCAL lock_timeout` for every engine transaction.
    pub lock_timeout: Duration,
    /// Optional `search_path`, e.g. to run against an isolated schema.
    pub schema: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(5),
            lock_timeout: Duration::from_secs(2),
            schema: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    /// In production, systemd EnvironmentFile provides the vars.
    pub fn from_env() -> Result<Self> {
        let defaults = StoreConfig::default();
        let store = StoreConfig {
            max_connections: parsed_var("DB_MAX_CONNECTIONS")?.unwrap_or(defaults.max_connections),
            acquire_timeout: millis_var("DB_ACQUIRE_TIMEOUT_MS")?
                .unwrap_or(defaults.acquire_timeout),
            statement_timeout: millis_var("DB_STATEMENT_TIMEOUT_MS")?
                .unwrap_or(defaults.statement_timeout),
            lock_timeout: millis_var("DB_LOCK_TIMEOUT_MS")?.unwrap_or(defaults.lock_timeout),
            schema: std::env::var("DB_SCHEMA").ok().filter(|s| !s.is_empty()),
        };

        let scoring = match std::env::var("SCORING_CONFIG") {
            Ok(path) if !path.is_empty() => ScoringConfig::load(&PathBuf::from(path))?,
            _ => ScoringConfig::default(),
        };

        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            store,
            scoring,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("environment variable {name} is malformed: {raw}"))),
        Err(_) => Ok(None),
    }
}

fn millis_var(name: &str) -> Result<Option<Duration>> {
    Ok(parsed_var::<u64>(name)?.map(Duration::from_millis))
}
