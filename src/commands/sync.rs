// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::{open_repository, Output};
use crate::config::Config;
use crate::repository::StoreRepository;
use anyhow::{Context, Result};

/// Show the server's store count and last sync time
pub async fn run(config: &Config, out: Output) -> Result<()> {
    let repository = open_repository(config)?;
    let sync = repository
        .get_store_sync_info()
        .await
        .context("Failed to fetch sync information")?;

    if out.json {
        return out.print_json(&sync);
    }
    println!("{} {}", out.dim("stores   "), out.strong(&sync.store_count.to_string()));
    println!("{} {}", out.dim("synced at"), sync.sync_time.format("%Y-%m-%d %H:%M:%S UTC"));
    Ok(())
}
