// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Paging of remote store listings into the local cache

pub mod mediator;
pub mod pager;

use crate::error::OngiError;
use crate::types::Store;
use serde::Serialize;

pub use mediator::StoreRemoteMediator;
pub use pager::StorePager;

/// Which edge of the listing a load extends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadType {
    /// Start over from the first page
    Refresh,
    /// Load before the first item
    Prepend,
    /// Load after the last item
    Append,
}

/// Page sizing shared by the pager and mediator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    /// Rows per page
    pub page_size: usize,
}

impl PagingConfig {
    /// Config with `page_size` rows per page (at least 1)
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }
}

/// What the pager has loaded so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingState {
    /// Rows currently held in the window
    pub loaded_count: usize,
    /// Sizing
    pub config: PagingConfig,
}

impl PagingState {
    /// Nothing loaded yet
    #[must_use]
    pub fn empty(config: PagingConfig) -> Self {
        Self {
            loaded_count: 0,
            config,
        }
    }
}

/// Outcome of one mediator load
#[derive(Debug)]
pub enum MediatorResult {
    /// Rows were written (possibly none)
    Success {
        /// No further pages exist in this direction
        end_of_pagination: bool,
    },
    /// The fetch or the cache write failed
    Error(OngiError),
}

impl MediatorResult {
    /// Convert into a `Result`, yielding the end-of-pagination flag
    pub fn into_result(self) -> crate::error::Result<bool> {
        match self {
            Self::Success { end_of_pagination } => Ok(end_of_pagination),
            Self::Error(err) => Err(err),
        }
    }
}

/// Load progress for one edge
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "message")]
pub enum LoadState {
    /// Idle
    #[default]
    NotLoading,
    /// A load is in flight
    Loading,
    /// The last load failed with this message
    Error(String),
}

/// Published view of a pager
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PagingSnapshot {
    /// Loaded window, in listing order
    pub items: Vec<Store>,
    /// Progress of the refresh edge
    pub refresh: LoadState,
    /// Progress of the append edge
    pub append: LoadState,
    /// No further remote pages exist
    pub end_of_pagination: bool,
}
