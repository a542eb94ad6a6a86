// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Local relational cache of queries and stores
//!
//! Three relations are kept: issued queries, store rows, and the ordered
//! listing linking a query to the stores it returned. The cache is the
//! single source of truth for listings; remote pages are written here and
//! read back. Two user-owned relations sit beside them and are never
//! evicted: liked stores and search history.

pub mod schema;
pub mod sqlite;

use crate::error::CacheError;
use crate::types::{QueryId, SearchHistory, Store, StoreQuery};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;

pub use sqlite::SqliteStoreCache;

/// How a fetched page lands in a query's listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Drop the query's current listing, then write the page at position 0
    Replace,
    /// Write the page after the query's current last position
    Append,
}

/// Stores of one query, tagged with the query they were read for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoresWithQuery {
    /// Query the rows belong to
    pub query_id: QueryId,
    /// Rows in listing order
    pub stores: Vec<Store>,
}

/// Outcome of an eviction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Query rows removed (their listings go with them)
    pub queries_removed: usize,
    /// Store rows no longer referenced by any listing
    pub stores_removed: usize,
}

/// Persistence port for the store cache
#[async_trait]
pub trait StoreCache: Send + Sync {
    /// Record `query` (or touch it if already present) and return its id.
    /// Equivalent queries always map to the same id.
    async fn upsert_query(&self, query: &StoreQuery) -> Result<QueryId, CacheError>;

    /// Write a page of stores into the listing of `query_id` atomically
    async fn write_page(
        &self,
        query_id: &QueryId,
        stores: &[Store],
        mode: WriteMode,
    ) -> Result<(), CacheError>;

    /// Number of rows in the listing of `query_id`
    async fn query_item_count(&self, query_id: &QueryId) -> Result<usize, CacheError>;

    /// A window of the listing of `query_id`, in listing order
    async fn stores_by_query(
        &self,
        query_id: &QueryId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Store>, CacheError>;

    /// The first `limit` rows of `query_id`, or `None` if the query is no
    /// longer cached
    async fn top_stores(
        &self,
        query_id: &QueryId,
        limit: usize,
    ) -> Result<Option<StoresWithQuery>, CacheError>;

    /// Point read of one store
    async fn get_store(&self, id: &str) -> Result<Option<Store>, CacheError>;

    /// Overwrite an existing store row; [`CacheError::StoreNotFound`] if absent
    async fn update_store(&self, store: &Store) -> Result<(), CacheError>;

    /// Whether the user has liked store `id`
    async fn is_liked(&self, id: &str) -> Result<bool, CacheError>;

    /// Overwrite the row of `store` and record (or clear) its like in one
    /// transaction; [`CacheError::StoreNotFound`] if the row is absent
    async fn set_liked(&self, store: &Store, liked: bool) -> Result<(), CacheError>;

    /// Record a search, moving an existing keyword to the front
    async fn add_search(&self, keyword: &str) -> Result<(), CacheError>;

    /// Up to `limit` past searches, most recent first
    async fn searches(&self, limit: usize) -> Result<Vec<SearchHistory>, CacheError>;

    /// Forget one search; unknown ids are ignored
    async fn delete_search(&self, id: i64) -> Result<(), CacheError>;

    /// Forget every search
    async fn clear_searches(&self) -> Result<(), CacheError>;

    /// Keep the `keep` most recently used queries, drop the rest and any
    /// stores left unreferenced
    async fn prune_queries(&self, keep: usize) -> Result<PruneReport, CacheError>;

    /// Change counter bumped after every committed write
    fn changes(&self) -> watch::Receiver<u64>;
}
