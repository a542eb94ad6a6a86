// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layers, lowest to highest: built-in defaults, the TOML file (explicit
//! path or the platform config dir), then `ONGI_*` environment variables.
//! Nested keys use a double underscore, e.g. `ONGI_RETRY__MAX_RETRIES`.

use crate::local::schema::STORE_DB_NAME;
use crate::remote::RetryPolicy;
use crate::screen::ScreenSettings;
use crate::types::Coordinates;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ONGI";

/// Config file name inside the platform config dir
pub const CONFIG_FILE_NAME: &str = "config.toml";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "aloe-droid", "ongi")
}

/// Retry settings for remote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First backoff delay
    pub initial_backoff_ms: u64,
    /// Backoff cap
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            initial_backoff_ms: u64::try_from(policy.initial_backoff.as_millis()).unwrap_or(200),
            max_backoff_ms: u64::try_from(policy.max_backoff.as_millis()).unwrap_or(2_000),
        }
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(cfg: RetryConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
            max_backoff: Duration::from_millis(cfg.max_backoff_ms.max(cfg.initial_backoff_ms)),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store API base URL, without the `/api/v1` prefix
    pub api_base_url: String,
    /// SQLite cache file
    pub database_path: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Retry of transient faults
    pub retry: RetryConfig,
    /// Rows per remote page
    pub page_size: u32,
    /// Queries kept in the cache before the least recently used are evicted
    pub max_cached_queries: usize,
    /// Minimum spacing between accepted navigation actions
    pub navigation_throttle_ms: u64,
    /// Latitude used when the device location is unavailable
    pub default_latitude: f64,
    /// Longitude used when the device location is unavailable
    pub default_longitude: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            database_path: project_dirs()
                .map(|d| d.data_dir().join(STORE_DB_NAME))
                .unwrap_or_else(|| PathBuf::from(".ongi").join(STORE_DB_NAME)),
            log_level: "info".to_string(),
            request_timeout_secs: 10,
            retry: RetryConfig::default(),
            page_size: crate::types::StoreQuery::DEFAULT_PAGE_SIZE,
            max_cached_queries: crate::repository::DEFAULT_MAX_CACHED_QUERIES,
            navigation_throttle_ms: 500,
            default_latitude: 37.5665,
            default_longitude: 126.978,
        }
    }
}

impl Config {
    /// Timeout applied to every HTTP request
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy for the remote data source
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.into()
    }

    /// Throttle window for navigation
    #[must_use]
    pub fn navigation_throttle(&self) -> Duration {
        Duration::from_millis(self.navigation_throttle_ms)
    }

    /// Fallback position
    #[must_use]
    pub fn default_location(&self) -> Coordinates {
        Coordinates::new(self.default_latitude, self.default_longitude)
    }

    /// Settings handed to screen models
    #[must_use]
    pub fn screen_settings(&self) -> ScreenSettings {
        ScreenSettings {
            default_location: self.default_location(),
            page_size: self.page_size.max(1),
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Default config file location, if the platform has one
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join(CONFIG_FILE_NAME))
}

/// Load configuration. An explicit `path` must exist; the default path is
/// optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let defaults = config::Config::try_from(&Config::default())
        .context("Failed to build default configuration")?;
    let mut builder = config::Config::builder().add_source(defaults);

    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None => {
            if let Some(path) = default_config_path() {
                builder = builder.add_source(config::File::from(path).required(false));
            }
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config: Config = builder
        .build()
        .context("Failed to load configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
