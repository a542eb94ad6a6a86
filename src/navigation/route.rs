// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Route keys and the bottom route catalog

use crate::types::StoreFilter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a navigable destination plus the parameters it needs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum RouteKey {
    /// Home feed
    Home,
    /// Store search
    Search {
        /// Opened from the bottom bar (keeps the bar visible)
        from_bottom_nav: bool,
    },
    /// Map view
    Map,
    /// Settings
    Setting,
    /// Filtered store listing
    FilteredStore {
        /// Filter for the listing
        filter: StoreFilter,
    },
    /// Store detail
    Store {
        /// Store identifier
        id: String,
    },
}

impl RouteKey {
    /// Store detail route
    #[must_use]
    pub fn store(id: impl Into<String>) -> Self {
        Self::Store { id: id.into() }
    }

    /// Filtered listing route
    #[must_use]
    pub fn filtered(filter: StoreFilter) -> Self {
        Self::FilteredStore { filter }
    }

    /// Search opened from inside a screen (bottom bar hidden)
    #[must_use]
    pub fn search() -> Self {
        Self::Search {
            from_bottom_nav: false,
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("home"),
            Self::Search { from_bottom_nav } => {
                if *from_bottom_nav {
                    f.write_str("search(bottom)")
                } else {
                    f.write_str("search")
                }
            }
            Self::Map => f.write_str("map"),
            Self::Setting => f.write_str("setting"),
            Self::FilteredStore { filter } => {
                write!(f, "filtered({}", filter.category.code())?;
                if !filter.search_query.is_empty() {
                    write!(f, ", q={}", filter.search_query)?;
                }
                if filter.only_favorites {
                    f.write_str(", favorites")?;
                }
                f.write_str(")")
            }
            Self::Store { id } => write!(f, "store({id})"),
        }
    }
}

/// Bottom navigation destination owning its own back stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// Home feed tab
    Home,
    /// Search tab
    Search,
    /// Map tab
    Map,
    /// Settings tab
    Setting,
}

impl Tab {
    /// Every tab in bar order
    pub const ALL: [Self; 4] = [Self::Home, Self::Search, Self::Map, Self::Setting];

    /// The key every stack of this tab starts with
    #[must_use]
    pub fn root_key(&self) -> RouteKey {
        match self {
            Self::Home => RouteKey::Home,
            Self::Search => RouteKey::Search {
                from_bottom_nav: true,
            },
            Self::Map => RouteKey::Map,
            Self::Setting => RouteKey::Setting,
        }
    }

    /// Parse a tab name (`home`, `search`, `map`, `setting`)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "home" => Some(Self::Home),
            "search" => Some(Self::Search),
            "map" => Some(Self::Map),
            "setting" | "settings" => Some(Self::Setting),
            _ => None,
        }
    }
}

/// Static catalog entry for the bottom bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BottomRoute {
    /// Label shown under the icon
    pub name: &'static str,
    /// Tab this entry selects
    pub tab: Tab,
    /// Icon when selected
    pub selected_icon: &'static str,
    /// Icon when not selected
    pub unselected_icon: &'static str,
}

impl BottomRoute {
    /// Root key of the entry's tab
    #[must_use]
    pub fn route_key(&self) -> RouteKey {
        self.tab.root_key()
    }

    /// The fixed catalog: Home, Search, Map, Setting
    #[must_use]
    pub fn default_catalog() -> Vec<Self> {
        vec![
            Self {
                name: "홈",
                tab: Tab::Home,
                selected_icon: "grid_view_fill_24px",
                unselected_icon: "grid_view_24px",
            },
            Self {
                name: "검색",
                tab: Tab::Search,
                selected_icon: "search_fill_24px",
                unselected_icon: "search_24px",
            },
            Self {
                name: "지도",
                tab: Tab::Map,
                selected_icon: "map_fill_24px",
                unselected_icon: "map_24px",
            },
            Self {
                name: "설정",
                tab: Tab::Setting,
                selected_icon: "settings_fill_24px",
                unselected_icon: "settings_24px",
            },
        ]
    }
}
