// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! List stores through the paged cache

use super::{open_repository, Output};
use crate::config::Config;
use crate::repository::StoreRepository;
use crate::types::{
    Coordinates, StoreCategory, StoreDistanceRange, StoreFilter, StoreQuery, StoreSortType,
};
use anyhow::{Context, Result};

/// Listing options from the command line
#[derive(Debug, Clone, Default)]
pub struct StoresArgs {
    /// Category code (e.g. `BAKERY`)
    pub category: Option<String>,
    /// Sort code (`NAME`, `FAVORITE`, `DISTANCE`)
    pub sort: Option<String>,
    /// Distance code (`M_5`, `K_1` … `K_15`, `NONE`)
    pub distance: Option<String>,
    /// Free-text keyword
    pub keyword: Option<String>,
    /// Favorites only
    pub favorites: bool,
    /// Latitude; config default when absent
    pub latitude: Option<f64>,
    /// Longitude; config default when absent
    pub longitude: Option<f64>,
    /// Pages to load
    pub pages: u32,
    /// Rows per page; config default when absent
    pub page_size: Option<u32>,
}

/// Build the filter described by `args`
pub fn filter_from_args(args: &StoresArgs) -> Result<StoreFilter> {
    let mut filter = StoreFilter::default().with_only_favorites(args.favorites);
    if let Some(code) = &args.category {
        let category = StoreCategory::from_code(code).ok_or_else(|| {
            anyhow::anyhow!("Unknown category: {code}. Valid: {}", codes(StoreCategory::ALL.iter().map(StoreCategory::code)))
        })?;
        filter = filter.with_category(category);
    }
    if let Some(code) = &args.sort {
        let sort = StoreSortType::from_code(code)
            .ok_or_else(|| anyhow::anyhow!("Unknown sort type: {code}. Valid: NAME, FAVORITE, DISTANCE"))?;
        filter = filter.with_sort_type(sort);
    }
    if let Some(code) = &args.distance {
        let range = StoreDistanceRange::from_code(code).ok_or_else(|| {
            anyhow::anyhow!("Unknown distance range: {code}. Valid: M_5, K_1, K_3, K_5, K_10, K_15, NONE")
        })?;
        filter = filter.with_distance_range(range);
    }
    if let Some(keyword) = &args.keyword {
        filter = filter.with_search_query(keyword.clone());
    }
    Ok(filter)
}

fn codes<'a>(codes: impl Iterator<Item = &'a str>) -> String {
    codes.collect::<Vec<_>>().join(", ")
}

/// Run stores command
pub async fn run(config: &Config, args: StoresArgs, out: Output) -> Result<()> {
    let filter = filter_from_args(&args)?;
    let settings = config.screen_settings();
    let location = Coordinates::new(
        args.latitude.unwrap_or(settings.default_location.latitude),
        args.longitude.unwrap_or(settings.default_location.longitude),
    );
    let query = StoreQuery::new(filter, location)
        .with_page_size(args.page_size.unwrap_or(settings.page_size));

    let repository = open_repository(config)?;
    let pager = repository
        .get_store_stream(&query)
        .await
        .context("Failed to prepare store listing")?;

    pager.refresh().await.context("Failed to load first page")?;
    for _ in 1..args.pages.max(1) {
        if !pager.load_more().await.context("Failed to load next page")? {
            break;
        }
    }

    let snapshot = pager.snapshot();
    tracing::info!(
        query_id = %pager.query_id(),
        rows = snapshot.items.len(),
        end_of_pagination = snapshot.end_of_pagination,
        "listing loaded"
    );

    if out.json {
        return out.print_json(&snapshot);
    }
    if snapshot.items.is_empty() {
        println!("{}", out.dim("No stores found"));
        return Ok(());
    }
    for (i, store) in snapshot.items.iter().enumerate() {
        out.store_line(i, store);
    }
    if !snapshot.end_of_pagination {
        println!("{}", out.dim("… more available (use --pages)"));
    }
    Ok(())
}
