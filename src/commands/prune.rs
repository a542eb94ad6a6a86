// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::{open_repository, Output};
use crate::config::Config;
use crate::repository::StoreRepository;
use anyhow::{Context, Result};

/// Evict least recently used queries from the cache
pub async fn run(config: &Config, keep: Option<usize>, out: Output) -> Result<()> {
    let keep = keep.unwrap_or(config.max_cached_queries);
    let repository = open_repository(config)?;
    let report = repository
        .prune_cache(keep)
        .await
        .context("Failed to prune store cache")?;

    tracing::info!(keep, queries = report.queries_removed, stores = report.stores_removed, "cache pruned");
    if out.json {
        return out.print_json(&report);
    }
    println!(
        "Removed {} queries and {} stores (keeping {keep})",
        report.queries_removed, report.stores_removed
    );
    Ok(())
}
