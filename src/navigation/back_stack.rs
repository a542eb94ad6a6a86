// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Per-tab back stacks
//!
//! [`BackStacks`] is the bare state machine: one non-empty stack per catalog
//! tab plus the active tab. It knows nothing about timing; throttling lives
//! in [`super::NavGraph`].

use super::route::{BottomRoute, RouteKey, Tab};
use crate::error::NavigationError;

/// One back stack per bottom tab and the currently active tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackStacks {
    /// Catalog tabs with their stacks, in catalog order
    stacks: Vec<(Tab, Vec<RouteKey>)>,
    initial: usize,
    current: usize,
}

impl BackStacks {
    /// Build the initial state: every tab at its root, `initial` active.
    ///
    /// Fails on an empty catalog, a duplicated tab, or an initial tab that is
    /// not in the catalog.
    pub fn new(catalog: &[BottomRoute], initial: Tab) -> Result<Self, NavigationError> {
        if catalog.is_empty() {
            return Err(NavigationError::EmptyCatalog);
        }

        let mut stacks: Vec<(Tab, Vec<RouteKey>)> = Vec::with_capacity(catalog.len());
        for route in catalog {
            if stacks.iter().any(|(tab, _)| *tab == route.tab) {
                return Err(NavigationError::DuplicateTab(route.tab));
            }
            stacks.push((route.tab, vec![route.route_key()]));
        }

        let initial = stacks
            .iter()
            .position(|(tab, _)| *tab == initial)
            .ok_or(NavigationError::InitialTabMissing(initial))?;

        Ok(Self {
            stacks,
            initial,
            current: initial,
        })
    }

    /// Active tab
    #[must_use]
    pub fn current_tab(&self) -> Tab {
        self.stacks[self.current].0
    }

    /// Tab that `on_back` falls back to
    #[must_use]
    pub fn initial_tab(&self) -> Tab {
        self.stacks[self.initial].0
    }

    /// Tabs in catalog order
    pub fn tabs(&self) -> impl Iterator<Item = Tab> + '_ {
        self.stacks.iter().map(|(tab, _)| *tab)
    }

    /// Stack of the active tab
    #[must_use]
    pub fn current_back_stack(&self) -> &[RouteKey] {
        &self.stacks[self.current].1
    }

    /// Stack of any catalog tab (empty slice for tabs outside the catalog)
    #[must_use]
    pub fn stack(&self, tab: Tab) -> &[RouteKey] {
        self.index_of(tab).map_or(&[], |i| self.stacks[i].1.as_slice())
    }

    /// Destination currently on screen
    #[must_use]
    pub fn top(&self) -> &RouteKey {
        let stack = self.current_back_stack();
        &stack[stack.len() - 1]
    }

    /// True iff the initial tab is active and sits at its root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.current == self.initial && self.current_back_stack().len() == 1
    }

    /// Switch the active tab. Returns whether the state changed.
    pub fn select(&mut self, tab: Tab) -> bool {
        let Some(index) = self.index_of(tab) else {
            tracing::warn!(?tab, "select ignored: tab not in catalog");
            return false;
        };
        if index == self.current {
            return false;
        }
        self.current = index;
        true
    }

    /// Push onto the active stack unless `key` is already on top
    pub fn navigate(&mut self, key: RouteKey) -> bool {
        let stack = &mut self.stacks[self.current].1;
        if stack.last() == Some(&key) {
            return false;
        }
        stack.push(key);
        true
    }

    /// Pop the active stack if it is above its root
    pub fn pop_back_stack(&mut self) -> bool {
        let stack = &mut self.stacks[self.current].1;
        if stack.len() > 1 {
            stack.pop();
            true
        } else {
            false
        }
    }

    /// Pop, else fall back to the initial tab, else do nothing
    pub fn on_back(&mut self) -> bool {
        if self.pop_back_stack() {
            return true;
        }
        if self.current != self.initial {
            self.current = self.initial;
            return true;
        }
        false
    }

    fn index_of(&self, tab: Tab) -> Option<usize> {
        self.stacks.iter().position(|(t, _)| *t == tab)
    }
}
