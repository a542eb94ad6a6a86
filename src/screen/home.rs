// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Home screen: nearby stores and entry points into filtered listings

use super::location::{self, LocationProvider};
use super::{ScreenContext, ScreenModel, ScreenSettings};
use crate::error::{LocationError, OngiError};
use crate::navigation::{NavRequest, RouteKey};
use crate::repository::StoreRepository;
use crate::types::{
    Coordinates, Store, StoreCategory, StoreDistanceRange, StoreFilter, StoreQuery, StoreSortType,
};
use serde::Serialize;
use std::sync::Arc;

/// Home screen state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeUiState {
    /// Nothing has loaded yet
    pub is_initial_state: bool,
    /// A pull-to-refresh is in progress
    pub is_refreshing: bool,
    /// Location permission was denied; offer the permission flow
    pub needs_permission: bool,
    /// Location services are off; offer to enable them
    pub gps_disabled: bool,
    /// Position the list was loaded for
    pub location: Option<Coordinates>,
    /// Nearby stores, closest first
    pub stores: Vec<Store>,
}

impl Default for HomeUiState {
    fn default() -> Self {
        Self {
            is_initial_state: true,
            is_refreshing: false,
            needs_permission: false,
            gps_disabled: false,
            location: None,
            stores: Vec::new(),
        }
    }
}

/// User input on the home screen
#[derive(Debug, Clone, PartialEq)]
pub enum HomeEvent {
    /// First appearance
    Load,
    /// Pull to refresh
    Refresh,
    /// Ask for location again after a permission or GPS prompt
    LocationRetry,
    /// The user declined the location prompt
    LocationSkip(String),
    /// Category shortcut
    SelectCategory(StoreCategory),
    /// "Nearby stores" shortcut
    SelectNearbyStores,
    /// "Popular stores" shortcut
    SelectFavoriteStores,
    /// Tap on a store
    SelectStore(String),
}

/// One-shot output of the home screen
#[derive(Debug, Clone, PartialEq)]
pub enum HomeEffect {
    /// Open a filtered listing
    NavigateStoreList(StoreFilter),
    /// Open a store
    NavigateStore(String),
    /// Show a transient error
    ShowErrorMessage(String),
}

impl HomeEffect {
    /// Navigation implied by this effect
    #[must_use]
    pub fn nav_request(&self) -> Option<NavRequest> {
        match self {
            Self::NavigateStoreList(filter) => {
                Some(NavRequest::Navigate(RouteKey::filtered(filter.clone())))
            }
            Self::NavigateStore(id) => Some(NavRequest::Navigate(RouteKey::store(id.clone()))),
            Self::ShowErrorMessage(_) => None,
        }
    }
}

fn handle_error(ctx: &ScreenContext<HomeUiState, HomeEffect>, err: &OngiError) {
    ctx.update_state(|s| {
        s.is_initial_state = false;
        s.is_refreshing = false;
    });
    ctx.send_effect(HomeEffect::ShowErrorMessage(err.to_string()));
}

/// Fall back to the rows last cached for `query`. Rows already on screen are
/// kept when the cache has none.
async fn show_cached(
    ctx: &ScreenContext<HomeUiState, HomeEffect>,
    repository: &dyn StoreRepository,
    query: &StoreQuery,
) {
    match repository.get_cached_store_list(query).await {
        Ok(cached) if !cached.is_empty() => {
            tracing::debug!(count = cached.len(), "refresh failed, showing cached stores");
            ctx.update_state(|s| s.stores = cached);
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(error = %err, "cached stores unavailable"),
    }
}

/// Home screen model
pub struct HomeScreen {
    model: ScreenModel<HomeUiState, HomeEffect>,
    repository: Arc<dyn StoreRepository>,
    location: Arc<dyn LocationProvider>,
    settings: ScreenSettings,
}

impl std::fmt::Debug for HomeScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomeScreen")
            .field("model", &self.model)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl HomeScreen {
    /// New home screen
    #[must_use]
    pub fn new(
        repository: Arc<dyn StoreRepository>,
        location: Arc<dyn LocationProvider>,
        settings: ScreenSettings,
    ) -> Self {
        Self {
            model: ScreenModel::new(HomeUiState::default(), handle_error),
            repository,
            location,
            settings,
        }
    }

    /// The underlying model (state, effects, tasks)
    pub fn model(&mut self) -> &mut ScreenModel<HomeUiState, HomeEffect> {
        &mut self.model
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> HomeUiState {
        self.model.state()
    }

    /// Handle one event
    pub fn send_event(&mut self, event: HomeEvent) {
        tracing::debug!(?event, "home event");
        match event {
            HomeEvent::Load => self.load(),
            HomeEvent::Refresh => {
                self.model.context().update_state(|s| {
                    s.is_refreshing = true;
                    s.needs_permission = false;
                });
                self.load();
            }
            HomeEvent::LocationRetry => {
                self.model.context().update_state(|s| {
                    s.needs_permission = false;
                    s.gps_disabled = false;
                });
                self.load();
            }
            HomeEvent::LocationSkip(message) => {
                let ctx = self.model.context();
                ctx.update_state(|s| {
                    s.needs_permission = false;
                    s.gps_disabled = false;
                });
                ctx.send_effect(HomeEffect::ShowErrorMessage(message));
            }
            HomeEvent::SelectCategory(category) => {
                self.select_stores(StoreFilter::default().with_category(category));
            }
            HomeEvent::SelectNearbyStores => {
                self.select_stores(StoreFilter::default().with_sort_type(StoreSortType::Distance));
            }
            HomeEvent::SelectFavoriteStores => self.select_stores(
                StoreFilter::default()
                    .with_sort_type(StoreSortType::Favorite)
                    .with_distance_range(StoreDistanceRange::None),
            ),
            HomeEvent::SelectStore(id) => {
                self.model.context().send_effect(HomeEffect::NavigateStore(id));
            }
        }
    }

    fn select_stores(&self, filter: StoreFilter) {
        self.model
            .context()
            .send_effect(HomeEffect::NavigateStoreList(filter));
    }

    fn load(&mut self) {
        let ctx = self.model.context();
        let repository = Arc::clone(&self.repository);
        let provider = Arc::clone(&self.location);
        let settings = self.settings;

        self.model.launch("home.load", async move {
            let (position, fault) =
                location::resolve(provider.as_ref(), settings.default_location).await;
            ctx.update_state(|s| {
                s.location = Some(position);
                match fault {
                    Some(LocationError::PermissionDenied) => s.needs_permission = true,
                    Some(LocationError::ServicesDisabled) => s.gps_disabled = true,
                    _ => {}
                }
            });

            let query = StoreQuery::new(
                StoreFilter::default().with_sort_type(StoreSortType::Distance),
                position,
            )
            .with_page_size(settings.page_size);
            let stores = match repository.get_store_list(&query).await {
                Ok(stores) => stores,
                Err(err) => {
                    show_cached(&ctx, repository.as_ref(), &query).await;
                    return Err(err);
                }
            };

            tracing::debug!(count = stores.len(), "home stores loaded");
            ctx.update_state(|s| {
                s.stores = stores;
                s.is_initial_state = false;
                s.is_refreshing = false;
            });
            Ok(())
        });
    }
}
