// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Filtered store listing with sort and distance sheets

use super::location::{self, LocationProvider};
use super::{ScreenContext, ScreenModel, ScreenSettings};
use crate::error::OngiError;
use crate::navigation::{NavRequest, RouteKey};
use crate::paging::{PagingSnapshot, StorePager};
use crate::repository::StoreRepository;
use crate::types::{Coordinates, StoreDistanceRange, StoreFilter, StoreQuery, StoreSortType};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

/// Bottom sheet currently open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilterSheet {
    /// Sort order picker
    Order,
    /// Distance range picker
    Distance,
}

/// Filtered listing state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredStoreUiState {
    /// Active filter
    pub filter: StoreFilter,
    /// Open sheet, if any
    pub sheet: Option<FilterSheet>,
    /// Position the listing is computed for
    pub location: Option<Coordinates>,
    /// Pull-to-refresh in progress
    pub is_refreshing: bool,
    /// Latest view of the paged listing
    pub paging: PagingSnapshot,
}

/// User input on the filtered listing
#[derive(Debug, Clone, PartialEq)]
pub enum FilteredStoreEvent {
    /// First appearance
    Load,
    /// Pull to refresh
    Refresh,
    /// Scrolled near the end
    LoadMore,
    /// Returned to this screen; pick up cache writes made elsewhere
    Resume,
    /// Tap on a store
    SelectStore(String),
    /// Open the sort sheet
    ShowOrderSheet,
    /// Open the distance sheet
    ShowDistanceSheet,
    /// Dismiss any sheet
    CloseSheet,
    /// Pick a sort order
    SelectSortType(StoreSortType),
    /// Pick a distance range
    SelectDistanceRange(StoreDistanceRange),
    /// Back arrow
    NavigateUp,
    /// Search icon
    OpenSearch,
}

/// One-shot output of the filtered listing
#[derive(Debug, Clone, PartialEq)]
pub enum FilteredStoreEffect {
    /// Open a store
    NavigateStore(String),
    /// Leave the listing
    NavigateUp,
    /// Open search
    NavigateSearch,
    /// The listing was rebuilt; scroll back to the top
    ScrollToFirstPosition,
    /// Show a transient error
    ShowErrorMessage(String),
}

impl FilteredStoreEffect {
    /// Navigation implied by this effect
    #[must_use]
    pub fn nav_request(&self) -> Option<NavRequest> {
        match self {
            Self::NavigateStore(id) => Some(NavRequest::Navigate(RouteKey::store(id.clone()))),
            Self::NavigateUp => Some(NavRequest::Up),
            Self::NavigateSearch => Some(NavRequest::Navigate(RouteKey::search())),
            Self::ScrollToFirstPosition | Self::ShowErrorMessage(_) => None,
        }
    }
}

type Ctx = ScreenContext<FilteredStoreUiState, FilteredStoreEffect>;

fn handle_error(ctx: &Ctx, err: &OngiError) {
    ctx.update_state(|s| s.is_refreshing = false);
    ctx.send_effect(FilteredStoreEffect::ShowErrorMessage(err.to_string()));
}

fn publish(ctx: &Ctx, pager: &StorePager) {
    let snapshot = pager.snapshot();
    ctx.update_state(|s| s.paging = snapshot);
}

/// Filtered listing screen model
pub struct FilteredStoreScreen {
    model: ScreenModel<FilteredStoreUiState, FilteredStoreEffect>,
    repository: Arc<dyn StoreRepository>,
    location: Arc<dyn LocationProvider>,
    settings: ScreenSettings,
    pager: Arc<Mutex<Option<Arc<StorePager>>>>,
}

impl std::fmt::Debug for FilteredStoreScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredStoreScreen")
            .field("model", &self.model)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl FilteredStoreScreen {
    /// Listing for `filter`
    #[must_use]
    pub fn new(
        filter: StoreFilter,
        repository: Arc<dyn StoreRepository>,
        location: Arc<dyn LocationProvider>,
        settings: ScreenSettings,
    ) -> Self {
        let initial = FilteredStoreUiState {
            filter,
            sheet: None,
            location: None,
            is_refreshing: false,
            paging: PagingSnapshot::default(),
        };
        Self {
            model: ScreenModel::new(initial, handle_error),
            repository,
            location,
            settings,
            pager: Arc::new(Mutex::new(None)),
        }
    }

    /// The underlying model (state, effects, tasks)
    pub fn model(&mut self) -> &mut ScreenModel<FilteredStoreUiState, FilteredStoreEffect> {
        &mut self.model
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> FilteredStoreUiState {
        self.model.state()
    }

    /// Handle one event
    pub fn send_event(&mut self, event: FilteredStoreEvent) {
        tracing::debug!(?event, "filtered store event");
        let ctx = self.model.context();
        match event {
            FilteredStoreEvent::Load => self.load(),
            FilteredStoreEvent::Refresh => {
                ctx.update_state(|s| s.is_refreshing = true);
                self.with_pager("filtered.refresh", |ctx, pager| async move {
                    let result = pager.refresh().await;
                    publish(&ctx, &pager);
                    ctx.update_state(|s| s.is_refreshing = false);
                    result
                });
            }
            FilteredStoreEvent::LoadMore => {
                self.with_pager("filtered.load_more", |ctx, pager| async move {
                    let result = pager.load_more().await;
                    publish(&ctx, &pager);
                    result.map(|_| ())
                });
            }
            FilteredStoreEvent::Resume => {
                self.with_pager("filtered.resume", |ctx, pager| async move {
                    if pager.reload_if_changed().await? {
                        publish(&ctx, &pager);
                    }
                    Ok(())
                });
            }
            FilteredStoreEvent::SelectStore(id) => {
                ctx.send_effect(FilteredStoreEffect::NavigateStore(id));
            }
            FilteredStoreEvent::ShowOrderSheet => {
                ctx.update_state(|s| s.sheet = Some(FilterSheet::Order));
            }
            FilteredStoreEvent::ShowDistanceSheet => {
                ctx.update_state(|s| s.sheet = Some(FilterSheet::Distance));
            }
            FilteredStoreEvent::CloseSheet => ctx.update_state(|s| s.sheet = None),
            FilteredStoreEvent::SelectSortType(sort_type) => {
                let filter = ctx.state().filter;
                if filter.sort_type == sort_type {
                    ctx.update_state(|s| s.sheet = None);
                } else {
                    self.rebuild(filter.with_sort_type(sort_type));
                }
            }
            FilteredStoreEvent::SelectDistanceRange(range) => {
                let filter = ctx.state().filter;
                if filter.distance_range == range {
                    ctx.update_state(|s| s.sheet = None);
                } else {
                    self.rebuild(filter.with_distance_range(range));
                }
            }
            FilteredStoreEvent::NavigateUp => ctx.send_effect(FilteredStoreEffect::NavigateUp),
            FilteredStoreEvent::OpenSearch => ctx.send_effect(FilteredStoreEffect::NavigateSearch),
        }
    }

    fn current_pager(&self) -> Option<Arc<StorePager>> {
        self.pager
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn with_pager<F, Fut>(&mut self, name: &'static str, f: F)
    where
        F: FnOnce(Ctx, Arc<StorePager>) -> Fut,
        Fut: std::future::Future<Output = crate::error::Result<()>> + Send + 'static,
    {
        match self.current_pager() {
            Some(pager) => {
                let work = f(self.model.context(), pager);
                self.model.launch(name, work);
            }
            None => tracing::debug!(task = name, "listing not loaded yet, ignoring"),
        }
    }

    fn rebuild(&mut self, filter: StoreFilter) {
        tracing::debug!(?filter, "rebuilding listing");
        self.model.abort_all();
        *self.pager.lock().unwrap_or_else(PoisonError::into_inner) = None;

        let ctx = self.model.context();
        ctx.update_state(|s| {
            s.filter = filter;
            s.sheet = None;
            s.paging = PagingSnapshot::default();
        });
        self.load();
        ctx.send_effect(FilteredStoreEffect::ScrollToFirstPosition);
    }

    fn load(&mut self) {
        let ctx = self.model.context();
        let repository = Arc::clone(&self.repository);
        let provider = Arc::clone(&self.location);
        let slot = Arc::clone(&self.pager);
        let settings = self.settings;

        self.model.launch("filtered.load", async move {
            let state = ctx.state();
            let position = match state.location {
                Some(position) => position,
                None => location::resolve(provider.as_ref(), settings.default_location).await.0,
            };
            let query = StoreQuery::new(state.filter, position).with_page_size(settings.page_size);

            let pager = Arc::new(repository.get_store_stream(&query).await?);
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&pager));
            ctx.update_state(|s| s.location = Some(position));

            let result = pager.refresh().await;
            publish(&ctx, &pager);
            result
        });
    }
}
