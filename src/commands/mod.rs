// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod config;
pub mod favorite;
pub mod home;
pub mod nav;
pub mod prune;
pub mod store;
pub mod stores;
pub mod sync;

use crate::config::Config;
use crate::local::SqliteStoreCache;
use crate::remote::{HttpStoreApi, StoreRemoteDataSource};
use crate::repository::CachedStoreRepository;
use crate::types::Store;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::sync::Arc;

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    /// Emit JSON instead of text
    pub json: bool,
    /// Use ANSI colors in text output
    pub color: bool,
}

impl Output {
    /// Print `value` as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("Failed to serialize output")?
        );
        Ok(())
    }

    /// Emphasised text
    #[must_use]
    pub fn strong(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// De-emphasised text
    #[must_use]
    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    /// One line per store
    pub fn store_line(&self, index: usize, store: &Store) {
        let favorites = format!("♥ {}", store.favorite_count);
        println!(
            "{:>3}. {} {} {:.2} km {}",
            index + 1,
            self.strong(&store.name),
            self.dim(store.category.code()),
            store.distance,
            if self.color {
                favorites.red().to_string()
            } else {
                favorites
            }
        );
    }
}

/// Repository wired from configuration
pub fn open_repository(config: &Config) -> Result<CachedStoreRepository> {
    let api = HttpStoreApi::new(config.api_base_url.clone(), config.request_timeout())
        .context("Failed to build HTTP client")?;
    let cache = SqliteStoreCache::open(&config.database_path).with_context(|| {
        format!(
            "Failed to open store cache at {}",
            config.database_path.display()
        )
    })?;
    let source = StoreRemoteDataSource::new(Arc::new(api), config.retry_policy());
    Ok(CachedStoreRepository::new(source, Arc::new(cache))
        .with_max_cached_queries(config.max_cached_queries))
}
