// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Settings page

use super::{ScreenContext, ScreenModel};
use crate::error::OngiError;
use crate::navigation::{NavRequest, RouteKey};
use crate::repository::StoreRepository;
use crate::types::{StoreDistanceRange, StoreFilter, StoreSync};
use serde::Serialize;
use std::sync::Arc;

/// Settings page state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingUiState {
    /// Nothing has loaded yet
    pub is_initial_state: bool,
    /// Server catalogue status
    pub sync: Option<StoreSync>,
}

/// User input on the settings page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingEvent {
    /// First appearance
    Load,
    /// "My favorite stores"
    ClickFavoriteStore,
    /// Privacy policy link
    ClickPrivacyPolicy,
    /// Contact the developer
    ClickInquiryToDeveloper,
    /// Location permission settings
    ClickLocationAuth,
}

/// One-shot output of the settings page
#[derive(Debug, Clone, PartialEq)]
pub enum SettingEffect {
    /// Open the favorites listing
    NavigateToFilteredStore(StoreFilter),
    /// Open the privacy policy
    MoveToPrivacyPolicy,
    /// Open the inquiry form
    MoveToInquiryToDeveloper,
    /// Open the system location settings
    MoveToLocationAuth,
    /// Show a transient error
    ShowErrorMessage(String),
}

impl SettingEffect {
    /// Navigation implied by this effect
    #[must_use]
    pub fn nav_request(&self) -> Option<NavRequest> {
        match self {
            Self::NavigateToFilteredStore(filter) => {
                Some(NavRequest::Navigate(RouteKey::filtered(filter.clone())))
            }
            _ => None,
        }
    }
}

/// Filter behind "my favorite stores": unbounded distance, favorites only
#[must_use]
pub fn favorite_stores_filter() -> StoreFilter {
    StoreFilter::default()
        .with_distance_range(StoreDistanceRange::None)
        .with_only_favorites(true)
}

fn handle_error(ctx: &ScreenContext<SettingUiState, SettingEffect>, err: &OngiError) {
    ctx.update_state(|s| s.is_initial_state = false);
    ctx.send_effect(SettingEffect::ShowErrorMessage(err.to_string()));
}

/// Settings page model
pub struct SettingScreen {
    model: ScreenModel<SettingUiState, SettingEffect>,
    repository: Arc<dyn StoreRepository>,
}

impl std::fmt::Debug for SettingScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingScreen")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl SettingScreen {
    /// New settings page
    #[must_use]
    pub fn new(repository: Arc<dyn StoreRepository>) -> Self {
        let initial = SettingUiState {
            is_initial_state: true,
            sync: None,
        };
        Self {
            model: ScreenModel::new(initial, handle_error),
            repository,
        }
    }

    /// The underlying model (state, effects, tasks)
    pub fn model(&mut self) -> &mut ScreenModel<SettingUiState, SettingEffect> {
        &mut self.model
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SettingUiState {
        self.model.state()
    }

    /// Handle one event
    pub fn send_event(&mut self, event: SettingEvent) {
        tracing::debug!(?event, "setting event");
        let ctx = self.model.context();
        match event {
            SettingEvent::Load => {
                let repository = Arc::clone(&self.repository);
                self.model.launch("setting.load", async move {
                    let sync = repository.get_store_sync_info().await?;
                    ctx.update_state(|s| {
                        s.sync = Some(sync);
                        s.is_initial_state = false;
                    });
                    Ok(())
                });
            }
            SettingEvent::ClickFavoriteStore => {
                ctx.send_effect(SettingEffect::NavigateToFilteredStore(favorite_stores_filter()));
            }
            SettingEvent::ClickPrivacyPolicy => ctx.send_effect(SettingEffect::MoveToPrivacyPolicy),
            SettingEvent::ClickInquiryToDeveloper => {
                ctx.send_effect(SettingEffect::MoveToInquiryToDeveloper);
            }
            SettingEvent::ClickLocationAuth => ctx.send_effect(SettingEffect::MoveToLocationAuth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::repository::CachedStoreRepository;
    use crate::testing::{self, FakeStoreApi};

    fn screen(api: Arc<FakeStoreApi>) -> SettingScreen {
        SettingScreen::new(Arc::new(CachedStoreRepository::new(
            testing::source(api),
            testing::cache(),
        )))
    }

    #[tokio::test]
    async fn test_load_shows_sync_info() {
        let mut page = screen(FakeStoreApi::with_stores(6));
        page.send_event(SettingEvent::Load);
        page.model().settle().await;
        let sync = page.state().sync.unwrap();
        assert_eq!(sync.store_count, 6);
        assert_eq!(sync.sync_time, testing::sync_time());
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let api = FakeStoreApi::with_stores(6);
        api.fail_next(ApiError::Decode("eof".into()));
        let mut page = screen(api);
        let mut effects = page.model().take_effects().unwrap();
        page.send_event(SettingEvent::Load);
        page.model().settle().await;
        assert!(!page.state().is_initial_state);
        assert!(matches!(
            effects.recv().await,
            Some(SettingEffect::ShowErrorMessage(_))
        ));
    }

    #[tokio::test]
    async fn test_favorite_stores_navigates_to_unbounded_favorites() {
        let mut page = screen(FakeStoreApi::with_stores(0));
        let mut effects = page.model().take_effects().unwrap();
        page.send_event(SettingEvent::ClickFavoriteStore);
        let effect = effects.recv().await.unwrap();
        let Some(NavRequest::Navigate(RouteKey::FilteredStore { filter })) = effect.nav_request()
        else {
            panic!("expected filtered store navigation");
        };
        assert!(filter.only_favorites);
        assert_eq!(filter.distance_range, StoreDistanceRange::None);
    }
}
