// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Retrying facade over [`StoreApi`]

use super::api::{StoreApi, StorePage};
use super::retry::RetryPolicy;
use crate::error::ApiError;
use crate::types::{Menu, Store, StoreDetail, StoreQuery};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Remote data source used by the repository and the mediator.
///
/// Each method is one logical remote call; transport faults inside it are
/// retried according to the configured [`RetryPolicy`].
#[derive(Clone)]
pub struct StoreRemoteDataSource {
    api: Arc<dyn StoreApi>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for StoreRemoteDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRemoteDataSource")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl StoreRemoteDataSource {
    /// Wrap an API with a retry policy
    #[must_use]
    pub fn new(api: Arc<dyn StoreApi>, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// Retry policy in effect
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// One page of the listing for `query`
    pub async fn get_stores(&self, query: &StoreQuery, page: u32) -> Result<StorePage, ApiError> {
        let params = query.to_query_params(page);
        let result = self
            .retry
            .run("get_stores", || self.api.get_stores(&params))
            .await;
        if let Ok(ref p) = result {
            tracing::debug!(page, rows = p.content.len(), last = p.last, "fetched store page");
        }
        result
    }

    /// One store with distance from the given position
    pub async fn get_store(&self, id: &str, latitude: f64, longitude: f64) -> Result<Store, ApiError> {
        self.retry
            .run("get_store", || self.api.get_store(id, latitude, longitude))
            .await
    }

    /// Extended information for one store
    pub async fn get_store_detail(&self, id: &str) -> Result<StoreDetail, ApiError> {
        self.retry
            .run("get_store_detail", || self.api.get_store_detail(id))
            .await
    }

    /// Menu of one store
    pub async fn get_store_menus(&self, id: &str) -> Result<Vec<Menu>, ApiError> {
        self.retry
            .run("get_store_menus", || self.api.get_store_menus(id))
            .await
    }

    /// Total number of stores known to the server
    pub async fn get_store_count(&self) -> Result<i64, ApiError> {
        self.retry
            .run("get_store_count", || self.api.get_store_count())
            .await
    }

    /// Last server-side sync time
    pub async fn get_store_sync_time(&self) -> Result<DateTime<Utc>, ApiError> {
        self.retry
            .run("get_store_sync_time", || self.api.get_sync_time())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coordinates, StoreFilter};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails `failures` times with a timeout, then serves an empty last page
    struct FlakyApi {
        failures: Mutex<u32>,
        seen: Mutex<Vec<Vec<(&'static str, String)>>>,
    }

    #[async_trait]
    impl StoreApi for FlakyApi {
        async fn get_stores(&self, params: &[(&'static str, String)]) -> Result<StorePage, ApiError> {
            self.seen.lock().unwrap().push(params.to_vec());
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(ApiError::Transport("timed out".into()));
            }
            Ok(StorePage {
                content: Vec::new(),
                page: 0,
                size: 20,
                last: true,
            })
        }
        async fn get_store(&self, id: &str, _: f64, _: f64) -> Result<Store, ApiError> {
            Err(ApiError::Decode(id.to_string()))
        }
        async fn get_store_detail(&self, id: &str) -> Result<StoreDetail, ApiError> {
            Err(ApiError::Decode(id.to_string()))
        }
        async fn get_store_menus(&self, _: &str) -> Result<Vec<Menu>, ApiError> {
            Ok(Vec::new())
        }
        async fn get_store_count(&self) -> Result<i64, ApiError> {
            Ok(7)
        }
        async fn get_sync_time(&self) -> Result<DateTime<Utc>, ApiError> {
            Ok(Utc::now())
        }
    }

    fn flaky(failures: u32) -> Arc<FlakyApi> {
        Arc::new(FlakyApi {
            failures: Mutex::new(failures),
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_two_timeouts_then_success() {
        let api = flaky(2);
        let source = StoreRemoteDataSource::new(api.clone(), RetryPolicy::immediate(3));
        let query = StoreQuery::new(StoreFilter::default(), Coordinates::new(37.5, 127.0));

        let page = source.get_stores(&query, 0).await.unwrap();
        assert!(page.last);

        let seen = api.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|p| p.contains(&("page", "0".to_string()))));
    }

    #[tokio::test]
    async fn test_decode_error_surfaces_once() {
        let source = StoreRemoteDataSource::new(flaky(0), RetryPolicy::immediate(3));
        let err = source.get_store("x", 0.0, 0.0).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(source.get_store_count().await.unwrap(), 7);
    }
}
