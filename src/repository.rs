// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Store repository: remote data source + local cache

use crate::error::{OngiError, Result};
use crate::local::{PruneReport, StoreCache};
use crate::paging::{LoadType, PagingConfig, PagingState, StorePager, StoreRemoteMediator};
use crate::remote::StoreRemoteDataSource;
use crate::types::{Menu, QueryId, SearchHistory, Store, StoreDetail, StoreQuery, StoreSync};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Default number of queries kept in the cache
pub const DEFAULT_MAX_CACHED_QUERIES: usize = 20;

/// Past searches returned by [`StoreRepository::get_search_history`]
pub const SEARCH_HISTORY_LIMIT: usize = 20;

/// Store access used by screens and the CLI
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Refresh the first page of `query` from the server and return it from
    /// the cache
    async fn get_store_list(&self, query: &StoreQuery) -> Result<Vec<Store>>;

    /// First page of `query` as last cached, without touching the network or
    /// the query's recency. Empty if the query was never cached or evicted.
    async fn get_cached_store_list(&self, query: &StoreQuery) -> Result<Vec<Store>>;

    /// Paged view of `query`; nothing is fetched until the pager is driven
    async fn get_store_stream(&self, query: &StoreQuery) -> Result<StorePager>;

    /// Cached copy of one store
    async fn get_local_store(&self, id: &str) -> Result<Store>;

    /// Fresh copy of one store, with distance from the given position
    async fn get_store(&self, id: &str, latitude: f64, longitude: f64) -> Result<Store>;

    /// Extended information for one store
    async fn get_store_detail(&self, id: &str) -> Result<StoreDetail>;

    /// Menu of one store
    async fn get_store_menus(&self, id: &str) -> Result<Vec<Menu>>;

    /// Move the cached favorite count of one store by one; returns the
    /// updated row
    async fn update_store_favorite_count(&self, id: &str, is_like: bool) -> Result<Store>;

    /// Whether the user has liked store `id`
    async fn is_store_liked(&self, id: &str) -> Result<bool>;

    /// Make the liked state of store `id` equal `liked`, moving its cached
    /// favorite count with it. Already in that state: the row is returned
    /// untouched.
    async fn set_store_liked(&self, id: &str, liked: bool) -> Result<Store>;

    /// Record a search keyword
    async fn add_search_history(&self, keyword: &str) -> Result<()>;

    /// Recent searches, most recent first
    async fn get_search_history(&self) -> Result<Vec<SearchHistory>>;

    /// Forget one search, or every search when `id` is `None`
    async fn delete_search_history(&self, id: Option<i64>) -> Result<()>;

    /// Number of stores on the server
    async fn get_store_count(&self) -> Result<i64>;

    /// Last server-side sync
    async fn get_store_sync_time(&self) -> Result<DateTime<Utc>>;

    /// Count and sync time together
    async fn get_store_sync_info(&self) -> Result<StoreSync>;

    /// Run the eviction policy with an explicit bound
    async fn prune_cache(&self, keep: usize) -> Result<PruneReport>;
}

/// [`StoreRepository`] that pages the remote API through the local cache
#[derive(Clone)]
pub struct CachedStoreRepository {
    source: StoreRemoteDataSource,
    cache: Arc<dyn StoreCache>,
    max_cached_queries: usize,
}

impl std::fmt::Debug for CachedStoreRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedStoreRepository")
            .field("source", &self.source)
            .field("max_cached_queries", &self.max_cached_queries)
            .finish_non_exhaustive()
    }
}

impl CachedStoreRepository {
    /// Repository with the default eviction bound
    #[must_use]
    pub fn new(source: StoreRemoteDataSource, cache: Arc<dyn StoreCache>) -> Self {
        Self {
            source,
            cache,
            max_cached_queries: DEFAULT_MAX_CACHED_QUERIES,
        }
    }

    /// Keep at most `n` queries cached (at least 1)
    #[must_use]
    pub fn with_max_cached_queries(mut self, n: usize) -> Self {
        self.max_cached_queries = n.max(1);
        self
    }

    /// The underlying cache
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn StoreCache> {
        &self.cache
    }

    async fn record_query(&self, query: &StoreQuery) -> Result<QueryId> {
        let query_id = self.cache.upsert_query(query).await?;
        let report = self.cache.prune_queries(self.max_cached_queries).await?;
        if report.queries_removed > 0 {
            tracing::debug!(
                evicted = report.queries_removed,
                keep = self.max_cached_queries,
                "evicted least recently used queries"
            );
        }
        Ok(query_id)
    }

    async fn read_top(&self, query_id: &QueryId, limit: usize) -> Result<Vec<Store>> {
        match self.cache.top_stores(query_id, limit).await? {
            Some(found) => Ok(found.stores),
            None => {
                tracing::warn!(%query_id, "query not cached, no rows to read");
                Ok(Vec::new())
            }
        }
    }

    fn mediator(&self, query: &StoreQuery, query_id: QueryId) -> StoreRemoteMediator {
        StoreRemoteMediator::new(
            self.source.clone(),
            Arc::clone(&self.cache),
            query.clone(),
            query_id,
        )
    }
}

#[async_trait]
impl StoreRepository for CachedStoreRepository {
    async fn get_store_list(&self, query: &StoreQuery) -> Result<Vec<Store>> {
        let query_id = self.record_query(query).await?;
        let page_size = usize::try_from(query.page_size).unwrap_or(1);

        let mediator = self.mediator(query, query_id.clone());
        let state = PagingState::empty(PagingConfig::new(page_size));
        mediator.load(LoadType::Refresh, &state).await.into_result()?;
        self.read_top(&query_id, page_size).await
    }

    async fn get_cached_store_list(&self, query: &StoreQuery) -> Result<Vec<Store>> {
        let page_size = usize::try_from(query.page_size).unwrap_or(1);
        self.read_top(&query.query_id(), page_size).await
    }

    async fn get_store_stream(&self, query: &StoreQuery) -> Result<StorePager> {
        let query_id = self.record_query(query).await?;
        Ok(StorePager::new(
            self.mediator(query, query_id),
            Arc::clone(&self.cache),
        ))
    }

    async fn get_local_store(&self, id: &str) -> Result<Store> {
        self.cache
            .get_store(id)
            .await?
            .ok_or_else(|| OngiError::NotFound(format!("store {id}")))
    }

    async fn get_store(&self, id: &str, latitude: f64, longitude: f64) -> Result<Store> {
        Ok(self.source.get_store(id, latitude, longitude).await?)
    }

    async fn get_store_detail(&self, id: &str) -> Result<StoreDetail> {
        Ok(self.source.get_store_detail(id).await?)
    }

    async fn get_store_menus(&self, id: &str) -> Result<Vec<Menu>> {
        Ok(self.source.get_store_menus(id).await?)
    }

    async fn update_store_favorite_count(&self, id: &str, is_like: bool) -> Result<Store> {
        let updated = self.get_local_store(id).await?.with_favorite_toggled(is_like);
        self.cache.update_store(&updated).await?;
        tracing::debug!(store_id = id, is_like, count = updated.favorite_count, "favorite toggled");
        Ok(updated)
    }

    async fn is_store_liked(&self, id: &str) -> Result<bool> {
        Ok(self.cache.is_liked(id).await?)
    }

    async fn set_store_liked(&self, id: &str, liked: bool) -> Result<Store> {
        let current = self.get_local_store(id).await?;
        if self.cache.is_liked(id).await? == liked {
            tracing::debug!(store_id = id, liked, "like state unchanged");
            return Ok(current);
        }
        let updated = current.with_favorite_toggled(liked);
        self.cache.set_liked(&updated, liked).await?;
        tracing::debug!(store_id = id, liked, count = updated.favorite_count, "like toggled");
        Ok(updated)
    }

    async fn add_search_history(&self, keyword: &str) -> Result<()> {
        Ok(self.cache.add_search(keyword).await?)
    }

    async fn get_search_history(&self) -> Result<Vec<SearchHistory>> {
        Ok(self.cache.searches(SEARCH_HISTORY_LIMIT).await?)
    }

    async fn delete_search_history(&self, id: Option<i64>) -> Result<()> {
        match id {
            Some(id) => self.cache.delete_search(id).await?,
            None => self.cache.clear_searches().await?,
        }
        Ok(())
    }

    async fn get_store_count(&self) -> Result<i64> {
        Ok(self.source.get_store_count().await?)
    }

    async fn get_store_sync_time(&self) -> Result<DateTime<Utc>> {
        Ok(self.source.get_store_sync_time().await?)
    }

    async fn get_store_sync_info(&self) -> Result<StoreSync> {
        let (store_count, sync_time) = tokio::try_join!(
            self.source.get_store_count(),
            self.source.get_store_sync_time()
        )?;
        Ok(StoreSync {
            store_count,
            sync_time,
        })
    }

    async fn prune_cache(&self, keep: usize) -> Result<PruneReport> {
        Ok(self.cache.prune_queries(keep.max(1)).await?)
    }
}
