// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Store page with optimistic favorite toggling

use super::location::{self, LocationProvider};
use super::{ScreenContext, ScreenModel, ScreenSettings};
use crate::error::OngiError;
use crate::navigation::NavRequest;
use crate::repository::StoreRepository;
use crate::types::{Menu, Store, StoreDetail};
use serde::Serialize;
use std::sync::Arc;

/// Store page state.
///
/// The page merges two sources: the store as fetched from the server and a
/// local override written by favorite toggles. The override wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreUiState {
    /// Store shown on this page
    pub id: String,
    /// Nothing has loaded yet
    pub is_initial_state: bool,
    /// Whether the user has liked the store, as persisted in the cache
    pub is_liked: bool,
    /// Store as fetched from the server
    pub remote: Option<Store>,
    /// Optimistic copy after a favorite toggle
    pub local_override: Option<Store>,
    /// Extended information
    pub detail: Option<StoreDetail>,
    /// Menu
    pub menus: Vec<Menu>,
}

impl StoreUiState {
    /// The store to display
    #[must_use]
    pub fn store(&self) -> Option<&Store> {
        self.local_override.as_ref().or(self.remote.as_ref())
    }
}

/// User input on the store page
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// First appearance
    Load,
    /// Heart button
    ToggleFavorite,
    /// Phone button
    Call,
    /// Address button
    OpenMap,
    /// The store could not be shown; leave with a message
    CantFindStore(String),
    /// Back arrow
    NavigateUp,
}

/// One-shot output of the store page
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEffect {
    /// Leave the page and show a message
    PopUpWithMessage(String),
    /// Dial a number
    MoveToCall(String),
    /// Open a map at the store
    MoveToMap {
        /// Street address
        address: String,
        /// Latitude
        latitude: f64,
        /// Longitude
        longitude: f64,
    },
    /// Show a transient error
    ShowErrorMessage(String),
    /// Leave the page
    NavigateUp,
}

impl StoreEffect {
    /// Navigation implied by this effect
    #[must_use]
    pub fn nav_request(&self) -> Option<NavRequest> {
        match self {
            Self::PopUpWithMessage(_) | Self::NavigateUp => Some(NavRequest::Up),
            Self::MoveToCall(_) | Self::MoveToMap { .. } | Self::ShowErrorMessage(_) => None,
        }
    }
}

fn handle_error(ctx: &ScreenContext<StoreUiState, StoreEffect>, err: &OngiError) {
    ctx.update_state(|s| s.is_initial_state = false);
    ctx.send_effect(StoreEffect::ShowErrorMessage(err.to_string()));
}

/// Store page model
pub struct StoreScreen {
    model: ScreenModel<StoreUiState, StoreEffect>,
    repository: Arc<dyn StoreRepository>,
    location: Arc<dyn LocationProvider>,
    settings: ScreenSettings,
}

impl std::fmt::Debug for StoreScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreScreen")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl StoreScreen {
    /// Page for store `id`
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        repository: Arc<dyn StoreRepository>,
        location: Arc<dyn LocationProvider>,
        settings: ScreenSettings,
    ) -> Self {
        let initial = StoreUiState {
            id: id.into(),
            is_initial_state: true,
            is_liked: false,
            remote: None,
            local_override: None,
            detail: None,
            menus: Vec::new(),
        };
        Self {
            model: ScreenModel::new(initial, handle_error),
            repository,
            location,
            settings,
        }
    }

    /// The underlying model (state, effects, tasks)
    pub fn model(&mut self) -> &mut ScreenModel<StoreUiState, StoreEffect> {
        &mut self.model
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> StoreUiState {
        self.model.state()
    }

    /// Handle one event
    pub fn send_event(&mut self, event: StoreEvent) {
        tracing::debug!(?event, "store event");
        let ctx = self.model.context();
        match event {
            StoreEvent::Load => self.load(),
            StoreEvent::ToggleFavorite => self.toggle_favorite(),
            StoreEvent::Call => {
                let phone = ctx.state().store().and_then(|s| s.phone.clone());
                match phone {
                    Some(phone) => ctx.send_effect(StoreEffect::MoveToCall(phone)),
                    None => ctx.send_effect(StoreEffect::ShowErrorMessage(
                        "no phone number for this store".to_string(),
                    )),
                }
            }
            StoreEvent::OpenMap => {
                if let Some(store) = ctx.state().store() {
                    ctx.send_effect(StoreEffect::MoveToMap {
                        address: store.address.clone(),
                        latitude: store.latitude,
                        longitude: store.longitude,
                    });
                }
            }
            StoreEvent::CantFindStore(message) => {
                ctx.send_effect(StoreEffect::PopUpWithMessage(message));
            }
            StoreEvent::NavigateUp => ctx.send_effect(StoreEffect::NavigateUp),
        }
    }

    fn load(&mut self) {
        let ctx = self.model.context();
        let repository = Arc::clone(&self.repository);
        let provider = Arc::clone(&self.location);
        let fallback = self.settings.default_location;

        self.model.launch("store.load", async move {
            let id = ctx.state().id;
            let (position, _) = location::resolve(provider.as_ref(), fallback).await;
            let (store, detail, menus, is_liked) = tokio::try_join!(
                repository.get_store(&id, position.latitude, position.longitude),
                repository.get_store_detail(&id),
                repository.get_store_menus(&id),
                repository.is_store_liked(&id),
            )?;
            ctx.update_state(|s| {
                s.is_liked = is_liked;
                s.remote = Some(store);
                s.detail = Some(detail);
                s.menus = menus;
                s.is_initial_state = false;
            });
            Ok(())
        });
    }

    /// Apply the toggle to the page first, then persist it. A failed write
    /// is reported but the page keeps the optimistic value.
    fn toggle_favorite(&mut self) {
        let ctx = self.model.context();
        let state = ctx.state();
        let Some(current) = state.store().cloned() else {
            tracing::debug!(id = %state.id, "store not loaded, ignoring favorite toggle");
            return;
        };

        let is_like = !state.is_liked;
        let toggled = current.with_favorite_toggled(is_like);
        ctx.update_state(|s| {
            s.is_liked = is_like;
            s.local_override = Some(toggled);
        });

        let repository = Arc::clone(&self.repository);
        let id = state.id;
        self.model.launch("store.toggle_favorite", async move {
            repository.set_store_liked(&id, is_like).await?;
            Ok(())
        });
    }
}
