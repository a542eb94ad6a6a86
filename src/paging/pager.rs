// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Live paged view over a cached query

use super::{
    LoadState, LoadType, PagingConfig, PagingSnapshot, PagingState, StoreRemoteMediator,
};
use crate::error::Result;
use crate::local::StoreCache;
use crate::types::QueryId;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

#[derive(Debug, Default)]
struct Cursor {
    seen_change: u64,
    last_failed: Option<LoadType>,
}

/// Paged window over one query's cached listing.
///
/// Reads always come from the cache; the mediator is asked for more only
/// when the cache runs out. Operations are serialised, so a refresh and a
/// load-more never interleave.
pub struct StorePager {
    mediator: StoreRemoteMediator,
    cache: Arc<dyn StoreCache>,
    config: PagingConfig,
    snapshot: watch::Sender<PagingSnapshot>,
    cursor: Mutex<Cursor>,
}

impl std::fmt::Debug for StorePager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorePager")
            .field("mediator", &self.mediator)
            .field("config", &self.config)
            .field("snapshot", &self.snapshot)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl StorePager {
    /// Pager for the mediator's query
    #[must_use]
    pub fn new(mediator: StoreRemoteMediator, cache: Arc<dyn StoreCache>) -> Self {
        let config = PagingConfig::new(usize::try_from(mediator.query().page_size).unwrap_or(1));
        let (snapshot, _) = watch::channel(PagingSnapshot::default());
        Self {
            mediator,
            cache,
            config,
            snapshot,
            cursor: Mutex::new(Cursor::default()),
        }
    }

    /// Cache id of the paged query
    #[must_use]
    pub fn query_id(&self) -> &QueryId {
        self.mediator.query_id()
    }

    /// Observe snapshots; the receiver starts with the current one
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PagingSnapshot> {
        self.snapshot.subscribe()
    }

    /// Current snapshot
    #[must_use]
    pub fn snapshot(&self) -> PagingSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Reload from the first page.
    ///
    /// An empty window is first filled from whatever the cache already
    /// holds, so stale rows show while the remote call is in flight.
    pub async fn refresh(&self) -> Result<()> {
        let mut cursor = self.cursor.lock().await;
        self.refresh_locked(&mut cursor).await
    }

    /// Extend the window by one page. Returns whether rows were added.
    pub async fn load_more(&self) -> Result<bool> {
        let mut cursor = self.cursor.lock().await;
        self.load_more_locked(&mut cursor).await
    }

    /// Repeat the last failed load. Returns false if nothing had failed.
    pub async fn retry(&self) -> Result<bool> {
        let mut cursor = self.cursor.lock().await;
        match cursor.last_failed.take() {
            Some(LoadType::Refresh) => self.refresh_locked(&mut cursor).await.map(|()| true),
            Some(LoadType::Append) => self.load_more_locked(&mut cursor).await,
            Some(LoadType::Prepend) | None => Ok(false),
        }
    }

    /// Re-read the loaded window from the cache
    pub async fn reload(&self) -> Result<()> {
        let mut cursor = self.cursor.lock().await;
        self.reload_locked(&mut cursor).await
    }

    /// Reload if the cache has been written since the last read.
    /// Returns whether a reload happened.
    pub async fn reload_if_changed(&self) -> Result<bool> {
        let mut cursor = self.cursor.lock().await;
        let current = *self.cache.changes().borrow();
        if current == cursor.seen_change {
            return Ok(false);
        }
        self.reload_locked(&mut cursor).await?;
        Ok(true)
    }

    async fn refresh_locked(&self, cursor: &mut Cursor) -> Result<()> {
        let window_empty = self.snapshot.borrow().items.is_empty();
        if window_empty {
            let cached = self
                .cache
                .stores_by_query(self.query_id(), 0, self.config.page_size)
                .await?;
            if !cached.is_empty() {
                tracing::debug!(query_id = %self.query_id(), rows = cached.len(), "showing cached rows");
                self.snapshot.send_modify(|s| s.items = cached);
            }
        }
        self.snapshot.send_modify(|s| s.refresh = LoadState::Loading);

        let state = PagingState::empty(self.config);
        let end_of_pagination = match self.mediator.load(LoadType::Refresh, &state).await.into_result() {
            Ok(end) => end,
            Err(err) => {
                cursor.last_failed = Some(LoadType::Refresh);
                self.snapshot
                    .send_modify(|s| s.refresh = LoadState::Error(err.to_string()));
                return Err(err);
            }
        };

        cursor.seen_change = *self.cache.changes().borrow();
        let items = self
            .cache
            .stores_by_query(self.query_id(), 0, self.config.page_size)
            .await?;
        self.snapshot.send_modify(|s| {
            s.items = items;
            s.refresh = LoadState::NotLoading;
            s.append = LoadState::NotLoading;
            s.end_of_pagination = end_of_pagination;
        });
        Ok(())
    }

    async fn load_more_locked(&self, cursor: &mut Cursor) -> Result<bool> {
        let loaded = self.snapshot.borrow().items.len();

        let cached = self
            .cache
            .stores_by_query(self.query_id(), loaded, self.config.page_size)
            .await?;
        if !cached.is_empty() {
            tracing::debug!(query_id = %self.query_id(), rows = cached.len(), "extended window from cache");
            self.snapshot.send_modify(|s| s.items.extend(cached));
            return Ok(true);
        }
        let exhausted = self.snapshot.borrow().end_of_pagination;
        if exhausted {
            return Ok(false);
        }

        self.snapshot.send_modify(|s| s.append = LoadState::Loading);
        let state = PagingState {
            loaded_count: loaded,
            config: self.config,
        };
        let end_of_pagination = match self.mediator.load(LoadType::Append, &state).await.into_result() {
            Ok(end) => end,
            Err(err) => {
                cursor.last_failed = Some(LoadType::Append);
                self.snapshot
                    .send_modify(|s| s.append = LoadState::Error(err.to_string()));
                return Err(err);
            }
        };

        cursor.seen_change = *self.cache.changes().borrow();
        let appended = self
            .cache
            .stores_by_query(self.query_id(), loaded, self.config.page_size)
            .await?;
        let added = !appended.is_empty();
        self.snapshot.send_modify(|s| {
            s.items.extend(appended);
            s.append = LoadState::NotLoading;
            s.end_of_pagination = end_of_pagination;
        });
        Ok(added)
    }

    async fn reload_locked(&self, cursor: &mut Cursor) -> Result<()> {
        cursor.seen_change = *self.cache.changes().borrow();
        let window = self.snapshot.borrow().items.len().max(self.config.page_size);
        let items = self
            .cache
            .stores_by_query(self.query_id(), 0, window)
            .await?;
        tracing::debug!(query_id = %self.query_id(), rows = items.len(), "reloaded window");
        self.snapshot.send_modify(|s| s.items = items);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, OngiError};
    use crate::testing::{self, FakeStoreApi};
    use crate::types::{Coordinates, StoreFilter, StoreQuery};

    async fn pager(api: Arc<FakeStoreApi>, page_size: u32) -> (StorePager, Arc<dyn StoreCache>) {
        let cache = testing::cache();
        let query = StoreQuery::new(StoreFilter::default(), Coordinates::new(37.5, 127.0))
            .with_page_size(page_size);
        let query_id = cache.upsert_query(&query).await.unwrap();
        let mediator =
            StoreRemoteMediator::new(testing::source(api), cache.clone(), query, query_id);
        (StorePager::new(mediator, cache.clone()), cache)
    }

    #[tokio::test]
    async fn test_refresh_then_append_until_end() {
        let api = FakeStoreApi::with_stores(25);
        let (pager, _) = pager(api.clone(), 10).await;

        pager.refresh().await.unwrap();
        assert_eq!(pager.snapshot().items.len(), 10);
        assert!(!pager.snapshot().end_of_pagination);

        assert!(pager.load_more().await.unwrap());
        assert!(pager.load_more().await.unwrap());
        let snap = pager.snapshot();
        assert_eq!(snap.items.len(), 25);
        assert!(snap.end_of_pagination);
        assert_eq!(snap.items[24].id, "s024");

        assert!(!pager.load_more().await.unwrap());
        assert_eq!(api.requested_pages(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_failed_append_is_retried() {
        let api = FakeStoreApi::with_stores(15);
        let (pager, _) = pager(api.clone(), 10).await;
        pager.refresh().await.unwrap();

        api.fail_next(ApiError::Decode("truncated".into()));
        let err = pager.load_more().await.unwrap_err();
        assert!(matches!(err, OngiError::Api(ApiError::Decode(_))));
        assert!(matches!(pager.snapshot().append, LoadState::Error(_)));

        assert!(pager.retry().await.unwrap());
        assert_eq!(pager.snapshot().items.len(), 15);
        assert_eq!(pager.snapshot().append, LoadState::NotLoading);
        assert!(!pager.retry().await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_cached_rows() {
        let api = FakeStoreApi::with_stores(5);
        let (pager, _) = pager(api.clone(), 10).await;
        pager.refresh().await.unwrap();

        let second = StorePager::new(pager.mediator.clone(), pager.cache.clone());
        api.fail_next(ApiError::Decode("bad".into()));
        assert!(second.refresh().await.is_err());
        let snap = second.snapshot();
        assert_eq!(snap.items.len(), 5);
        assert!(matches!(snap.refresh, LoadState::Error(_)));
    }

    #[tokio::test]
    async fn test_reload_if_changed_follows_cache_writes() {
        let api = FakeStoreApi::with_stores(3);
        let (pager, cache) = pager(api, 10).await;
        pager.refresh().await.unwrap();
        assert!(!pager.reload_if_changed().await.unwrap());

        let mut liked = pager.snapshot().items[0].clone();
        liked.favorite_count += 1;
        cache.update_store(&liked).await.unwrap();

        assert!(pager.reload_if_changed().await.unwrap());
        assert_eq!(pager.snapshot().items[0].favorite_count, liked.favorite_count);
    }
}
