// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error taxonomy for the store and navigation layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::navigation::Tab;

/// Structured error body returned by the store API on non-2xx responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// HTTP status code
    pub status: u16,
    /// Short error code or reason phrase
    pub error: String,
    /// Human readable message
    pub message: String,
    /// Request path that failed
    #[serde(default)]
    pub path: String,
    /// Server timestamp of the failure
    #[serde(default = "Utc::now")]
    pub time_stamp: DateTime<Utc>,
}

/// Failure of a single remote call
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Network unreachable, timed out or the connection broke mid-body
    #[error("network error: {0}")]
    Transport(String),
    /// The server answered with a non-2xx status
    #[error("server rejected request ({}): {}", .0.status, .0.message)]
    Server(ErrorBody),
    /// The server answered 2xx but the payload did not decode
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether a retry might succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Local cache failure
#[derive(Debug, Error)]
pub enum CacheError {
    /// SQLite reported an error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A persisted column could not be decoded
    #[error("corrupt cache row: {0}")]
    Serde(String),
    /// Point read or update on a store that is not cached
    #[error("store not cached: {0}")]
    StoreNotFound(String),
    /// The blocking task running the statement failed
    #[error("cache task failed: {0}")]
    Task(String),
    /// The database directory could not be created
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Location faults, distinct from transport faults so screens can branch
/// into a permission recovery flow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user denied location permission
    #[error("location permission denied")]
    PermissionDenied,
    /// Location services are switched off on the device
    #[error("location services are disabled")]
    ServicesDisabled,
    /// Any other provider failure
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Invalid navigation catalog; a programming error raised at construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// No bottom routes were supplied
    #[error("bottom route catalog is empty")]
    EmptyCatalog,
    /// The same tab appears twice
    #[error("tab {0:?} appears more than once in the bottom route catalog")]
    DuplicateTab(Tab),
    /// The initial tab is not part of the catalog
    #[error("initial tab {0:?} is not in the bottom route catalog")]
    InitialTabMissing(Tab),
}

/// Top-level error surfaced by repositories and screens
#[derive(Debug, Error)]
pub enum OngiError {
    /// Remote call failed
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Local cache failed
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// Location could not be determined
    #[error(transparent)]
    Location(#[from] LocationError),
    /// Navigation catalog misconfigured
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    /// Requested entity does not exist
    #[error("not found: {0}")]
    NotFound(String),
}

impl OngiError {
    /// Whether this is a transient network fault
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Api(api) if api.is_transient())
    }
}

/// Result alias used throughout the library
pub type Result<T, E = OngiError> = std::result::Result<T, E>;
