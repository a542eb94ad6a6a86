// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Back-stack-per-tab navigation

pub mod back_stack;
pub mod bottom_bar;
pub mod graph;
pub mod route;
pub mod throttle;

pub use back_stack::BackStacks;
pub use bottom_bar::{BottomBarItem, BottomBarState};
pub use graph::{NavGraph, NavGraphUiState, NavRequest};
pub use route::{BottomRoute, RouteKey, Tab};
pub use throttle::{Clock, ManualClock, NavigationThrottler, SystemClock, DEFAULT_NAVIGATION_INTERVAL};
