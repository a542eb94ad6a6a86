// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Search tab: live results while typing, plus search history

use super::location::{self, LocationProvider};
use super::{ScreenContext, ScreenModel, ScreenSettings};
use crate::error::{OngiError, Result};
use crate::navigation::{NavRequest, RouteKey};
use crate::repository::StoreRepository;
use crate::types::{SearchHistory, Store, StoreFilter, StoreQuery};
use serde::Serialize;
use std::sync::Arc;

/// Search screen state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchUiState {
    /// Nothing has loaded yet
    pub is_initial_state: bool,
    /// Text in the search field
    pub search_query: String,
    /// First page of stores matching `search_query`
    pub results: Vec<Store>,
    /// Past searches, most recent first
    pub history: Vec<SearchHistory>,
}

/// User input on the search screen
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// First appearance
    Load,
    /// The search field changed
    ChangeQuery(String),
    /// The keyboard search action
    SearchQuery(String),
    /// Tap on a live result
    SelectStore {
        /// Store identifier
        id: String,
        /// Store name, recorded in history
        name: String,
    },
    /// Remove one history entry
    DeleteQuery(i64),
    /// Remove every history entry
    DeleteAllQuery,
    /// Back arrow
    NavigateUp,
}

/// One-shot output of the search screen
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEffect {
    /// Open the filtered listing for a keyword
    NavigateToFilteredStoreList(String),
    /// Open a store
    SelectStore(String),
    /// Leave the screen
    NavigateUp,
    /// Show a transient error
    ShowErrorMessage(String),
}

impl SearchEffect {
    /// Navigation implied by this effect
    #[must_use]
    pub fn nav_request(&self) -> Option<NavRequest> {
        match self {
            Self::NavigateToFilteredStoreList(keyword) => Some(NavRequest::Navigate(
                RouteKey::filtered(StoreFilter::default().with_search_query(keyword.clone())),
            )),
            Self::SelectStore(id) => Some(NavRequest::Navigate(RouteKey::store(id.clone()))),
            Self::NavigateUp => Some(NavRequest::Up),
            Self::ShowErrorMessage(_) => None,
        }
    }
}

type Ctx = ScreenContext<SearchUiState, SearchEffect>;

fn handle_error(ctx: &Ctx, err: &OngiError) {
    ctx.update_state(|s| s.is_initial_state = false);
    ctx.send_effect(SearchEffect::ShowErrorMessage(err.to_string()));
}

async fn reload_history(ctx: &Ctx, repository: &dyn StoreRepository) -> Result<()> {
    let history = repository.get_search_history().await?;
    ctx.update_state(|s| s.history = history);
    Ok(())
}

/// Search screen model
pub struct SearchScreen {
    model: ScreenModel<SearchUiState, SearchEffect>,
    repository: Arc<dyn StoreRepository>,
    location: Arc<dyn LocationProvider>,
    settings: ScreenSettings,
}

impl std::fmt::Debug for SearchScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchScreen")
            .field("model", &self.model)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SearchScreen {
    /// New search screen
    #[must_use]
    pub fn new(
        repository: Arc<dyn StoreRepository>,
        location: Arc<dyn LocationProvider>,
        settings: ScreenSettings,
    ) -> Self {
        let initial = SearchUiState {
            is_initial_state: true,
            ..SearchUiState::default()
        };
        Self {
            model: ScreenModel::new(initial, handle_error),
            repository,
            location,
            settings,
        }
    }

    /// The underlying model (state, effects, tasks)
    pub fn model(&mut self) -> &mut ScreenModel<SearchUiState, SearchEffect> {
        &mut self.model
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SearchUiState {
        self.model.state()
    }

    /// Handle one event
    pub fn send_event(&mut self, event: SearchEvent) {
        tracing::debug!(?event, "search event");
        let ctx = self.model.context();
        let repository = Arc::clone(&self.repository);
        match event {
            SearchEvent::Load => self.model.launch("search.load", async move {
                reload_history(&ctx, repository.as_ref()).await?;
                ctx.update_state(|s| s.is_initial_state = false);
                Ok(())
            }),
            SearchEvent::ChangeQuery(query) => {
                ctx.update_state(|s| s.search_query.clone_from(&query));
                if query.trim().is_empty() {
                    ctx.update_state(|s| s.results.clear());
                } else {
                    self.lookup(query);
                }
            }
            SearchEvent::SearchQuery(query) => {
                if query.trim().is_empty() {
                    tracing::debug!("blank search ignored");
                    return;
                }
                self.model.launch("search.submit", async move {
                    repository.add_search_history(&query).await?;
                    ctx.update_state(|s| s.search_query.clone_from(&query));
                    ctx.send_effect(SearchEffect::NavigateToFilteredStoreList(query));
                    reload_history(&ctx, repository.as_ref()).await
                });
            }
            SearchEvent::SelectStore { id, name } => {
                self.model.launch("search.select", async move {
                    repository.add_search_history(&name).await?;
                    ctx.send_effect(SearchEffect::SelectStore(id));
                    reload_history(&ctx, repository.as_ref()).await
                });
            }
            SearchEvent::DeleteQuery(id) => {
                self.model.launch("search.delete", async move {
                    repository.delete_search_history(Some(id)).await?;
                    reload_history(&ctx, repository.as_ref()).await
                });
            }
            SearchEvent::DeleteAllQuery => {
                self.model.launch("search.clear", async move {
                    repository.delete_search_history(None).await?;
                    reload_history(&ctx, repository.as_ref()).await
                });
            }
            SearchEvent::NavigateUp => ctx.send_effect(SearchEffect::NavigateUp),
        }
    }

    /// Results for `query`, dropped if the field changed before they arrived
    fn lookup(&mut self, query: String) {
        let ctx = self.model.context();
        let repository = Arc::clone(&self.repository);
        let provider = Arc::clone(&self.location);
        let settings = self.settings;

        self.model.launch("search.lookup", async move {
            let (position, _) =
                location::resolve(provider.as_ref(), settings.default_location).await;
            let store_query = StoreQuery::new(
                StoreFilter::default().with_search_query(query.clone()),
                position,
            )
            .with_page_size(settings.page_size);
            let results = repository.get_store_list(&store_query).await?;
            ctx.update_state(|s| {
                if s.search_query == query {
                    s.results = results;
                } else {
                    tracing::debug!(stale = %query, "dropping stale search results");
                }
            });
            Ok(())
        });
    }
}
