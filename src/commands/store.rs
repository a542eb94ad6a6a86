// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Show one store

use super::{open_repository, Output};
use crate::config::Config;
use crate::repository::StoreRepository;
use anyhow::{Context, Result};
use serde::Serialize;

/// Run store command
pub async fn run(
    config: &Config,
    id: &str,
    position: (Option<f64>, Option<f64>),
    detail: bool,
    menus: bool,
    out: Output,
) -> Result<()> {
    let repository = open_repository(config)?;
    let latitude = position.0.unwrap_or(config.default_latitude);
    let longitude = position.1.unwrap_or(config.default_longitude);

    let store = repository
        .get_store(id, latitude, longitude)
        .await
        .with_context(|| format!("Failed to fetch store {id}"))?;
    let detail = if detail {
        Some(repository.get_store_detail(id).await.context("Failed to fetch store detail")?)
    } else {
        None
    };
    let menus = if menus {
        Some(repository.get_store_menus(id).await.context("Failed to fetch store menus")?)
    } else {
        None
    };

    if out.json {
        #[derive(Serialize)]
        struct View<'a> {
            store: &'a crate::types::Store,
            #[serde(skip_serializing_if = "Option::is_none")]
            detail: Option<&'a crate::types::StoreDetail>,
            #[serde(skip_serializing_if = "Option::is_none")]
            menus: Option<&'a [crate::types::Menu]>,
        }
        return out.print_json(&View {
            store: &store,
            detail: detail.as_ref(),
            menus: menus.as_deref(),
        });
    }

    println!("{}", out.strong(&store.name));
    println!("  {} {}", out.dim("category"), store.category.code());
    println!("  {} {}", out.dim("address "), store.address);
    if let Some(phone) = &store.phone {
        println!("  {} {}", out.dim("phone   "), phone);
    }
    println!("  {} {:.2} km", out.dim("distance"), store.distance);
    println!("  {} {}", out.dim("likes   "), store.favorite_count);

    if let Some(detail) = detail {
        if !detail.description.is_empty() {
            println!("\n{}", detail.description);
        }
        if let Some(hours) = detail.business_hours {
            println!("  {} {}", out.dim("hours   "), hours);
        }
        if !detail.tags.is_empty() {
            println!("  {} {}", out.dim("tags    "), detail.tags.join(", "));
        }
    }
    if let Some(menus) = menus {
        println!();
        for menu in menus {
            println!("  {:<24} {:>8} ₩", menu.name, menu.price);
        }
    }
    Ok(())
}
