// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Nearby stores, loaded the way the home tab loads them

use super::{open_repository, Output};
use crate::config::Config;
use crate::repository::StoreRepository;
use crate::screen::{FixedLocation, HomeEffect, HomeEvent, HomeScreen};
use crate::types::Coordinates;
use anyhow::{bail, Result};
use std::sync::Arc;

/// Run home command
pub async fn run(config: &Config, position: (Option<f64>, Option<f64>), out: Output) -> Result<()> {
    let settings = config.screen_settings();
    let here = Coordinates::new(
        position.0.unwrap_or(settings.default_location.latitude),
        position.1.unwrap_or(settings.default_location.longitude),
    );
    let repository: Arc<dyn StoreRepository> = Arc::new(open_repository(config)?);
    let mut home = HomeScreen::new(repository, Arc::new(FixedLocation::at(here)), settings);
    let Some(mut effects) = home.model().take_effects() else {
        bail!("Home screen effects already taken");
    };

    home.send_event(HomeEvent::Load);
    home.model().settle().await;

    let mut failure = None;
    while let Ok(effect) = effects.try_recv() {
        if let HomeEffect::ShowErrorMessage(message) = effect {
            failure = Some(message);
        }
    }

    let state = home.state();
    match failure {
        Some(message) if state.stores.is_empty() => bail!("Failed to load nearby stores: {message}"),
        Some(message) => tracing::warn!(%message, "refresh failed, showing cached stores"),
        None => {}
    }

    if out.json {
        return out.print_json(&state);
    }
    if state.stores.is_empty() {
        println!("{}", out.dim("No stores nearby"));
        return Ok(());
    }
    for (i, store) in state.stores.iter().enumerate() {
        out.store_line(i, store);
    }
    Ok(())
}
