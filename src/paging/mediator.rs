// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Remote → cache page loader for one query

use super::{LoadType, MediatorResult, PagingState};
use crate::error::OngiError;
use crate::local::{StoreCache, WriteMode};
use crate::remote::StoreRemoteDataSource;
use crate::types::{QueryId, StoreQuery};
use std::sync::Arc;

/// Loads remote pages of one query into the cache.
///
/// The mediator does not retry; retries of transport faults happen inside
/// the data source, and anything that still fails is handed back unchanged.
#[derive(Clone)]
pub struct StoreRemoteMediator {
    source: StoreRemoteDataSource,
    cache: Arc<dyn StoreCache>,
    query: StoreQuery,
    query_id: QueryId,
}

impl std::fmt::Debug for StoreRemoteMediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRemoteMediator")
            .field("query_id", &self.query_id)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl StoreRemoteMediator {
    /// Mediator for `query`, already recorded in the cache as `query_id`
    #[must_use]
    pub fn new(
        source: StoreRemoteDataSource,
        cache: Arc<dyn StoreCache>,
        query: StoreQuery,
        query_id: QueryId,
    ) -> Self {
        Self {
            source,
            cache,
            query,
            query_id,
        }
    }

    /// The query this mediator loads
    #[must_use]
    pub fn query(&self) -> &StoreQuery {
        &self.query
    }

    /// Cache id of the query
    #[must_use]
    pub fn query_id(&self) -> &QueryId {
        &self.query_id
    }

    /// Perform one load
    pub async fn load(&self, load_type: LoadType, state: &PagingState) -> MediatorResult {
        let (page, mode) = match load_type {
            LoadType::Prepend => {
                return MediatorResult::Success {
                    end_of_pagination: true,
                }
            }
            LoadType::Refresh => (0, WriteMode::Replace),
            LoadType::Append => {
                let page = state.loaded_count / state.config.page_size.max(1);
                (u32::try_from(page).unwrap_or(u32::MAX), WriteMode::Append)
            }
        };

        match self.fetch_and_write(page, mode).await {
            Ok(end_of_pagination) => MediatorResult::Success { end_of_pagination },
            Err(err) => {
                tracing::error!(
                    query_id = %self.query_id,
                    ?load_type,
                    page,
                    error = %err,
                    "store page load failed"
                );
                MediatorResult::Error(err)
            }
        }
    }

    async fn fetch_and_write(&self, page: u32, mode: WriteMode) -> Result<bool, OngiError> {
        let fetched = self.source.get_stores(&self.query, page).await?;
        let page_size = usize::try_from(self.query.page_size).unwrap_or(usize::MAX);
        let end_of_pagination = fetched.last || fetched.content.len() < page_size;

        self.cache
            .write_page(&self.query_id, &fetched.content, mode)
            .await?;

        tracing::debug!(
            query_id = %self.query_id,
            page,
            rows = fetched.content.len(),
            end_of_pagination,
            "store page cached"
        );
        Ok(end_of_pagination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::paging::PagingConfig;
    use crate::testing::{self, FakeStoreApi};
    use crate::types::{Coordinates, StoreFilter};

    async fn mediator(api: Arc<FakeStoreApi>, page_size: u32) -> (StoreRemoteMediator, Arc<dyn StoreCache>) {
        let cache = testing::cache();
        let query = StoreQuery::new(StoreFilter::default(), Coordinates::new(37.5, 127.0))
            .with_page_size(page_size);
        let query_id = cache.upsert_query(&query).await.unwrap();
        (
            StoreRemoteMediator::new(testing::source(api), cache.clone(), query, query_id),
            cache,
        )
    }

    fn state(loaded_count: usize, page_size: usize) -> PagingState {
        PagingState {
            loaded_count,
            config: PagingConfig::new(page_size),
        }
    }

    #[tokio::test]
    async fn test_refresh_replaces_rows_in_server_order() {
        let api = FakeStoreApi::with_stores(3);
        let (mediator, cache) = mediator(api.clone(), 20).await;

        let result = mediator.load(LoadType::Refresh, &state(0, 20)).await;
        assert!(matches!(result, MediatorResult::Success { end_of_pagination: true }));

        api.set_catalogue(vec![testing::store("z"), testing::store("y")]);
        mediator.load(LoadType::Refresh, &state(3, 20)).await.into_result().unwrap();

        let ids: Vec<_> = cache
            .stores_by_query(mediator.query_id(), 0, 20)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["z", "y"]);
    }

    #[tokio::test]
    async fn test_append_requests_next_page() {
        let api = FakeStoreApi::with_stores(12);
        let (mediator, cache) = mediator(api.clone(), 5).await;

        mediator.load(LoadType::Refresh, &state(0, 5)).await.into_result().unwrap();
        let end = mediator
            .load(LoadType::Append, &state(5, 5))
            .await
            .into_result()
            .unwrap();
        assert!(!end);
        let end = mediator
            .load(LoadType::Append, &state(10, 5))
            .await
            .into_result()
            .unwrap();
        assert!(end);

        assert_eq!(api.requested_pages(), vec![0, 1, 2]);
        assert_eq!(cache.query_item_count(mediator.query_id()).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_prepend_never_fetches() {
        let api = FakeStoreApi::with_stores(3);
        let (mediator, _) = mediator(api.clone(), 5).await;
        let result = mediator.load(LoadType::Prepend, &state(0, 5)).await;
        assert!(matches!(result, MediatorResult::Success { end_of_pagination: true }));
        assert!(api.requested_pages().is_empty());
    }

    #[tokio::test]
    async fn test_errors_are_returned_unchanged() {
        let api = FakeStoreApi::with_stores(3);
        api.fail_next(testing::not_found("/api/v1/stores"));
        let (mediator, _) = mediator(api, 5).await;
        match mediator.load(LoadType::Refresh, &state(0, 5)).await {
            MediatorResult::Error(OngiError::Api(ApiError::Server(body))) => {
                assert_eq!(body.status, 404);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
