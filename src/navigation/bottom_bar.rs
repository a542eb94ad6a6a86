// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Bottom bar presentation

use super::route::{BottomRoute, RouteKey, Tab};
use serde::Serialize;

/// One tab button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BottomBarItem {
    /// Label
    pub name: &'static str,
    /// Tab selected when tapped
    pub tab: Tab,
    /// Icon to draw for the current selection state
    pub icon: &'static str,
    /// Whether this item is highlighted
    pub selected: bool,
}

/// What the bottom bar should show for the destination on screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BottomBarState {
    /// Whether the bar is drawn at all
    pub visible: bool,
    /// Items in catalog order
    pub items: Vec<BottomBarItem>,
}

impl BottomBarState {
    /// Derive bar state from the catalog and the top of the active stack.
    ///
    /// The bar shows on tab roots and on a search opened from the bar; any
    /// pushed destination hides it.
    #[must_use]
    pub fn present(catalog: &[BottomRoute], top: &RouteKey) -> Self {
        let is_bottom_route = catalog.iter().any(|route| &route.route_key() == top);
        let is_search_from_bottom = matches!(
            top,
            RouteKey::Search {
                from_bottom_nav: true
            }
        );

        let items = catalog
            .iter()
            .map(|route| {
                let selected = &route.route_key() == top;
                BottomBarItem {
                    name: route.name,
                    tab: route.tab,
                    icon: if selected {
                        route.selected_icon
                    } else {
                        route.unselected_icon
                    },
                    selected,
                }
            })
            .collect();

        Self {
            visible: is_bottom_route || is_search_from_bottom,
            items,
        }
    }

    /// The highlighted tab, if any
    #[must_use]
    pub fn selected_tab(&self) -> Option<Tab> {
        self.items.iter().find(|item| item.selected).map(|item| item.tab)
    }
}
