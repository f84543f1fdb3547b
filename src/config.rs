//! Configuration from environment variables.

use std::env;
use thiserror::Error;

/// Default upstream catalog base URL.
pub const DEFAULT_CATALOG_URL: &str = "https://www.themealdb.com/api/json/v1/1";

/// Default trailing-edge debounce window for interactive search, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default cap on visible results per dispatched query.
pub const DEFAULT_MAX_RESULTS: usize = 12;

/// Default number of random records fetched for an empty query.
pub const DEFAULT_SAMPLE_SIZE: usize = 12;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Discovery-layer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream recipe catalog.
    pub catalog_url: String,
    /// Base URL of the favorites store.
    pub favorites_url: String,
    /// Trailing-edge debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Cap on visible results per dispatched query.
    pub max_results: usize,
    /// Random-sample batch size for empty queries.
    pub sample_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `SKILLET_FAVORITES_URL`: base URL of the favorites store
    ///
    /// Optional:
    /// - `SKILLET_CATALOG_URL`: catalog base URL (default: TheMealDB v1)
    /// - `SKILLET_DEBOUNCE_MS`: debounce window in ms (default: 300)
    /// - `SKILLET_MAX_RESULTS`: visible result cap (default: 12)
    /// - `SKILLET_SAMPLE_SIZE`: random-sample size (default: 12)
    pub fn from_env() -> Result<Self, ConfigError> {
        let favorites_url = env::var("SKILLET_FAVORITES_URL")
            .map_err(|_| ConfigError::MissingEnvVar("SKILLET_FAVORITES_URL".to_string()))?;

        let catalog_url =
            env::var("SKILLET_CATALOG_URL").unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string());

        let debounce_ms = env_or("SKILLET_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS);
        let max_results = env_or("SKILLET_MAX_RESULTS", DEFAULT_MAX_RESULTS);
        let sample_size = env_or("SKILLET_SAMPLE_SIZE", DEFAULT_SAMPLE_SIZE);

        Ok(Self {
            catalog_url,
            favorites_url,
            debounce_ms,
            max_results,
            sample_size,
        })
    }
}

/// Read a numeric env var, falling back to the default on absence or parse failure.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
