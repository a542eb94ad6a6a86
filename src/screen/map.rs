// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Map tab: stores around the map center and the selected marker

use super::location::{self, LocationProvider};
use super::{ScreenContext, ScreenModel, ScreenSettings};
use crate::error::{LocationError, OngiError};
use crate::navigation::{NavRequest, RouteKey};
use crate::repository::StoreRepository;
use crate::types::{
    Coordinates, Store, StoreDistanceRange, StoreFilter, StoreQuery, StoreSortType,
};
use serde::Serialize;
use std::sync::Arc;

/// Visible radius before the user moves the map
pub const DEFAULT_MAP_RADIUS_KM: f64 = 1.0;

/// Map screen state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapUiState {
    /// Nothing has loaded yet
    pub is_initial_state: bool,
    /// A device location lookup is in progress
    pub check_location: bool,
    /// A nearby-store search is in progress
    pub find_stores: bool,
    /// Location permission was denied
    pub needs_permission: bool,
    /// Location services are off
    pub gps_disabled: bool,
    /// Last known device position
    pub location: Option<Coordinates>,
    /// Current map center
    pub map_center: Option<Coordinates>,
    /// Radius visible on the map
    pub map_radius_km: f64,
    /// Stores found around the center, closest first
    pub stores: Vec<Store>,
    /// Marker the user tapped
    pub selected_marker_id: Option<String>,
    /// Cached copy of the tapped marker's store
    pub selected_marker: Option<Store>,
}

impl Default for MapUiState {
    fn default() -> Self {
        Self {
            is_initial_state: true,
            check_location: false,
            find_stores: false,
            needs_permission: false,
            gps_disabled: false,
            location: None,
            map_center: None,
            map_radius_km: DEFAULT_MAP_RADIUS_KM,
            stores: Vec::new(),
            selected_marker_id: None,
            selected_marker: None,
        }
    }
}

/// User input on the map
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// First appearance
    Load,
    /// Ask for location again after a permission or GPS prompt
    LocationRetry,
    /// The user declined the location prompt
    LocationSkip(String),
    /// "My location" button: recenter on the device and search there
    CheckLocation,
    /// The map was panned or zoomed
    ChangeMapInfo {
        /// New center
        center: Coordinates,
        /// Visible radius
        radius_km: f64,
    },
    /// Tap on a marker
    SelectStoreMarker(String),
    /// "Search this area" button
    SearchNearbyStores,
    /// Tap on a store card
    SelectStore(String),
}

/// One-shot output of the map
#[derive(Debug, Clone, PartialEq)]
pub enum MapEffect {
    /// Open a store
    NavigateStore(String),
    /// New results; scroll the card list back to the start
    ScrollToFirstPosition,
    /// Show a transient error
    ShowErrorMessage(String),
}

impl MapEffect {
    /// Navigation implied by this effect
    #[must_use]
    pub fn nav_request(&self) -> Option<NavRequest> {
        match self {
            Self::NavigateStore(id) => Some(NavRequest::Navigate(RouteKey::store(id.clone()))),
            Self::ScrollToFirstPosition | Self::ShowErrorMessage(_) => None,
        }
    }
}

type Ctx = ScreenContext<MapUiState, MapEffect>;

fn handle_error(ctx: &Ctx, err: &OngiError) {
    ctx.update_state(|s| {
        s.is_initial_state = false;
        s.check_location = false;
        s.find_stores = false;
    });
    ctx.send_effect(MapEffect::ShowErrorMessage(err.to_string()));
}

fn nearby_query(center: Coordinates, radius_km: f64, page_size: u32) -> StoreQuery {
    let filter = StoreFilter::default()
        .with_sort_type(StoreSortType::Distance)
        .with_distance_range(StoreDistanceRange::covering(radius_km));
    StoreQuery::new(filter, center).with_page_size(page_size)
}

/// Map screen model
pub struct MapScreen {
    model: ScreenModel<MapUiState, MapEffect>,
    repository: Arc<dyn StoreRepository>,
    location: Arc<dyn LocationProvider>,
    settings: ScreenSettings,
}

impl std::fmt::Debug for MapScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapScreen")
            .field("model", &self.model)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl MapScreen {
    /// New map screen
    #[must_use]
    pub fn new(
        repository: Arc<dyn StoreRepository>,
        location: Arc<dyn LocationProvider>,
        settings: ScreenSettings,
    ) -> Self {
        Self {
            model: ScreenModel::new(MapUiState::default(), handle_error),
            repository,
            location,
            settings,
        }
    }

    /// The underlying model (state, effects, tasks)
    pub fn model(&mut self) -> &mut ScreenModel<MapUiState, MapEffect> {
        &mut self.model
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> MapUiState {
        self.model.state()
    }

    /// Handle one event
    pub fn send_event(&mut self, event: MapEvent) {
        tracing::debug!(?event, "map event");
        let ctx = self.model.context();
        match event {
            MapEvent::Load => self.locate_and_search(),
            MapEvent::LocationRetry => {
                ctx.update_state(|s| {
                    s.needs_permission = false;
                    s.gps_disabled = false;
                    s.is_initial_state = true;
                });
                self.locate_and_search();
            }
            MapEvent::LocationSkip(message) => {
                ctx.update_state(|s| {
                    s.needs_permission = false;
                    s.gps_disabled = false;
                });
                ctx.send_effect(MapEffect::ShowErrorMessage(message));
            }
            MapEvent::CheckLocation => {
                ctx.update_state(|s| s.check_location = true);
                self.locate_and_search();
            }
            MapEvent::ChangeMapInfo { center, radius_km } => ctx.update_state(|s| {
                s.map_center = Some(center);
                s.map_radius_km = radius_km;
            }),
            MapEvent::SelectStoreMarker(id) => self.select_marker(id),
            MapEvent::SearchNearbyStores => {
                ctx.update_state(|s| {
                    s.find_stores = true;
                    s.selected_marker_id = None;
                    s.selected_marker = None;
                });
                ctx.send_effect(MapEffect::ScrollToFirstPosition);
                self.search_center();
            }
            MapEvent::SelectStore(id) => ctx.send_effect(MapEffect::NavigateStore(id)),
        }
    }

    /// Ask for the device position, center the map on it and search there
    fn locate_and_search(&mut self) {
        let ctx = self.model.context();
        let repository = Arc::clone(&self.repository);
        let provider = Arc::clone(&self.location);
        let settings = self.settings;

        self.model.launch("map.locate", async move {
            let (position, fault) =
                location::resolve(provider.as_ref(), settings.default_location).await;
            let radius_km = ctx.state().map_radius_km;
            ctx.update_state(|s| {
                s.location = Some(position);
                s.map_center = Some(position);
                match fault {
                    Some(LocationError::PermissionDenied) => s.needs_permission = true,
                    Some(LocationError::ServicesDisabled) => s.gps_disabled = true,
                    _ => {}
                }
            });

            let query = nearby_query(position, radius_km, settings.page_size);
            let stores = repository.get_store_list(&query).await?;
            publish(&ctx, stores);
            Ok(())
        });
    }

    fn search_center(&mut self) {
        let ctx = self.model.context();
        let repository = Arc::clone(&self.repository);
        let settings = self.settings;

        self.model.launch("map.search", async move {
            let state = ctx.state();
            let center = state
                .map_center
                .or(state.location)
                .unwrap_or(settings.default_location);
            let query = nearby_query(center, state.map_radius_km, settings.page_size);
            let stores = repository.get_store_list(&query).await?;
            publish(&ctx, stores);
            Ok(())
        });
    }

    /// Markers come from the last search, so the cached row is enough
    fn select_marker(&mut self, id: String) {
        let ctx = self.model.context();
        ctx.update_state(|s| s.selected_marker_id = Some(id.clone()));
        let repository = Arc::clone(&self.repository);

        self.model.launch("map.marker", async move {
            let store = repository.get_local_store(&id).await?;
            ctx.update_state(|s| {
                if s.selected_marker_id.as_deref() == Some(id.as_str()) {
                    s.selected_marker = Some(store);
                }
            });
            Ok(())
        });
    }
}

fn publish(ctx: &Ctx, stores: Vec<Store>) {
    tracing::debug!(count = stores.len(), "map stores loaded");
    ctx.update_state(|s| {
        s.stores = stores;
        s.is_initial_state = false;
        s.check_location = false;
        s.find_stores = false;
    });
}
