// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Throttled navigation host state

use super::back_stack::BackStacks;
use super::route::{BottomRoute, RouteKey, Tab};
use super::throttle::NavigationThrottler;
use crate::error::NavigationError;
use serde::Serialize;
use tokio::sync::watch;

/// Snapshot of the navigation state published to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavGraphUiState {
    /// Active tab
    pub current_tab: Tab,
    /// Stack of the active tab, root first
    pub current_back_stack: Vec<RouteKey>,
    /// Whether system back should be left to the embedding shell
    pub is_root: bool,
}

impl NavGraphUiState {
    fn of(stacks: &BackStacks) -> Self {
        Self {
            current_tab: stacks.current_tab(),
            current_back_stack: stacks.current_back_stack().to_vec(),
            is_root: stacks.is_root(),
        }
    }

    /// Destination on screen
    #[must_use]
    pub fn top(&self) -> Option<&RouteKey> {
        self.current_back_stack.last()
    }
}

/// Navigation asked for by a screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavRequest {
    /// Push a destination on the active tab
    Navigate(RouteKey),
    /// Leave the current destination
    Up,
}

/// Per-tab back stacks behind a navigation throttle
///
/// All four operations go through the same throttler, so a burst of taps
/// only applies the first one in each window. Accepted operations that change
/// state are published on a watch channel.
#[derive(Debug)]
pub struct NavGraph {
    stacks: BackStacks,
    catalog: Vec<BottomRoute>,
    throttler: NavigationThrottler,
    state_tx: watch::Sender<NavGraphUiState>,
}

impl NavGraph {
    /// Build a graph over `catalog` starting on `initial`
    pub fn new(
        catalog: Vec<BottomRoute>,
        initial: Tab,
        throttler: NavigationThrottler,
    ) -> Result<Self, NavigationError> {
        let stacks = BackStacks::new(&catalog, initial)?;
        let (state_tx, _) = watch::channel(NavGraphUiState::of(&stacks));
        Ok(Self {
            stacks,
            catalog,
            throttler,
            state_tx,
        })
    }

    /// The default four-tab catalog starting on Home
    #[must_use]
    pub fn with_default_catalog(throttler: NavigationThrottler) -> Self {
        let catalog = BottomRoute::default_catalog();
        let stacks = BackStacks::new(&catalog, Tab::Home)
            .unwrap_or_else(|err| unreachable!("default catalog is valid: {err}"));
        let (state_tx, _) = watch::channel(NavGraphUiState::of(&stacks));
        Self {
            stacks,
            catalog,
            throttler,
            state_tx,
        }
    }

    /// Observe state changes; the receiver starts with the current state
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NavGraphUiState> {
        self.state_tx.subscribe()
    }

    /// Current snapshot
    #[must_use]
    pub fn ui_state(&self) -> NavGraphUiState {
        NavGraphUiState::of(&self.stacks)
    }

    /// Bottom route catalog this graph was built from
    #[must_use]
    pub fn catalog(&self) -> &[BottomRoute] {
        &self.catalog
    }

    /// Active tab
    #[must_use]
    pub fn current_tab(&self) -> Tab {
        self.stacks.current_tab()
    }

    /// Stack of the active tab
    #[must_use]
    pub fn current_back_stack(&self) -> &[RouteKey] {
        self.stacks.current_back_stack()
    }

    /// Stack of any tab
    #[must_use]
    pub fn stack(&self, tab: Tab) -> &[RouteKey] {
        self.stacks.stack(tab)
    }

    /// See [`BackStacks::is_root`]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.stacks.is_root()
    }

    /// Switch tabs. Returns false if throttled or already active.
    pub fn select(&mut self, tab: Tab) -> bool {
        self.apply("select", |stacks| stacks.select(tab))
    }

    /// Push a destination. Returns false if throttled or already on top.
    pub fn navigate(&mut self, key: RouteKey) -> bool {
        self.apply("navigate", |stacks| stacks.navigate(key))
    }

    /// Pop the active stack. Returns false if throttled or at the tab root.
    pub fn pop_back_stack(&mut self) -> bool {
        self.apply("pop_back_stack", BackStacks::pop_back_stack)
    }

    /// Back press. Returns false if throttled or already at the root.
    pub fn on_back(&mut self) -> bool {
        self.apply("on_back", BackStacks::on_back)
    }

    /// Route a screen's navigation request
    pub fn dispatch(&mut self, request: NavRequest) -> bool {
        match request {
            NavRequest::Navigate(key) => self.navigate(key),
            NavRequest::Up => self.pop_back_stack(),
        }
    }

    fn apply(&mut self, op: &'static str, f: impl FnOnce(&mut BackStacks) -> bool) -> bool {
        let stacks = &mut self.stacks;
        let changed = self.throttler.execute(|| f(stacks)).unwrap_or(false);
        if changed {
            let state = NavGraphUiState::of(&self.stacks);
            tracing::debug!(
                op,
                tab = ?state.current_tab,
                depth = state.current_back_stack.len(),
                "navigation state changed"
            );
            self.state_tx.send_replace(state);
        }
        changed
    }
}
