// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::{open_repository, Output};
use crate::config::Config;
use crate::repository::StoreRepository;
use anyhow::{Context, Result};

/// Like (or unlike) a cached store
pub async fn run(config: &Config, id: &str, unlike: bool, out: Output) -> Result<()> {
    let repository = open_repository(config)?;
    let store = repository
        .update_store_favorite_count(id, !unlike)
        .await
        .with_context(|| format!("Failed to update favorites of {id} (list it first to cache it)"))?;

    if out.json {
        return out.print_json(&store);
    }
    println!(
        "{} {} → {}",
        if unlike { "Unliked" } else { "Liked" },
        out.strong(&store.name),
        store.favorite_count
    );
    Ok(())
}
