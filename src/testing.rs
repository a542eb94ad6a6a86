// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! In-process fakes shared by unit tests

use crate::error::{ApiError, ErrorBody};
use crate::local::{SqliteStoreCache, StoreCache};
use crate::remote::{RetryPolicy, StoreApi, StorePage, StoreRemoteDataSource};
use crate::types::{Menu, Store, StoreCategory, StoreDetail};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Store fixture
pub fn store(id: &str) -> Store {
    Store {
        id: id.to_string(),
        name: format!("Store {id}"),
        category: StoreCategory::KoreanFood,
        address: "Jongno-gu, Seoul".to_string(),
        phone: Some("02-000-0000".to_string()),
        latitude: 37.57,
        longitude: 126.98,
        distance: 0.5,
        favorite_count: 10,
        image_url: None,
    }
}

/// Fixed server sync time
pub fn sync_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 9, 30, 0).single().unwrap_or_default()
}

/// Scripted store API serving a fixed catalogue page by page
#[derive(Default)]
pub struct FakeStoreApi {
    catalogue: Mutex<Vec<Store>>,
    failures: Mutex<VecDeque<ApiError>>,
    requested_pages: Mutex<Vec<u32>>,
}

impl FakeStoreApi {
    pub fn with_stores(n: usize) -> Arc<Self> {
        let api = Self::default();
        *api.catalogue.lock().unwrap() = (0..n).map(|i| store(&format!("s{i:03}"))).collect();
        Arc::new(api)
    }

    /// Queue an error returned by the next call instead of its result
    pub fn fail_next(&self, err: ApiError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub fn set_catalogue(&self, stores: Vec<Store>) {
        *self.catalogue.lock().unwrap() = stores;
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested_pages.lock().unwrap().clone()
    }

    fn take_failure(&self) -> Result<(), ApiError> {
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn not_found(path: &str) -> ApiError {
    ApiError::Server(ErrorBody {
        status: 404,
        error: "Not Found".to_string(),
        message: "store does not exist".to_string(),
        path: path.to_string(),
        time_stamp: sync_time(),
    })
}

pub fn server_error(status: u16) -> ApiError {
    ApiError::Server(ErrorBody {
        status,
        error: "Internal Server Error".to_string(),
        message: "upstream unavailable".to_string(),
        path: "/api/v1/stores".to_string(),
        time_stamp: sync_time(),
    })
}

fn param(params: &[(&'static str, String)], name: &str) -> Option<u32> {
    params
        .iter()
        .find(|(k, _)| *k == name)
        .and_then(|(_, v)| v.parse().ok())
}

#[async_trait]
impl StoreApi for FakeStoreApi {
    async fn get_stores(&self, params: &[(&'static str, String)]) -> Result<StorePage, ApiError> {
        self.take_failure()?;
        let page = param(params, "page").unwrap_or(0);
        let size = param(params, "size").unwrap_or(20);
        self.requested_pages.lock().unwrap().push(page);

        let catalogue = self.catalogue.lock().unwrap();
        let start = (page * size) as usize;
        let end = (start + size as usize).min(catalogue.len());
        let content = catalogue.get(start..end).map(<[Store]>::to_vec).unwrap_or_default();
        Ok(StorePage {
            content,
            page,
            size,
            last: end >= catalogue.len(),
        })
    }

    async fn get_store(&self, id: &str, _: f64, _: f64) -> Result<Store, ApiError> {
        self.take_failure()?;
        self.catalogue
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| not_found(&format!("/api/v1/stores/{id}")))
    }

    async fn get_store_detail(&self, id: &str) -> Result<StoreDetail, ApiError> {
        self.take_failure()?;
        Ok(StoreDetail {
            id: id.to_string(),
            description: "Family run since 1988".to_string(),
            business_hours: Some("09:00-21:00".to_string()),
            tags: vec!["parking".to_string()],
        })
    }

    async fn get_store_menus(&self, _: &str) -> Result<Vec<Menu>, ApiError> {
        self.take_failure()?;
        Ok(vec![Menu {
            name: "Gimbap".to_string(),
            price: 4500,
            image_url: None,
        }])
    }

    async fn get_store_count(&self) -> Result<i64, ApiError> {
        self.take_failure()?;
        Ok(i64::try_from(self.catalogue.lock().unwrap().len()).unwrap_or(i64::MAX))
    }

    async fn get_sync_time(&self) -> Result<DateTime<Utc>, ApiError> {
        self.take_failure()?;
        Ok(sync_time())
    }
}

/// Data source over `api` that retries immediately
pub fn source(api: Arc<FakeStoreApi>) -> StoreRemoteDataSource {
    StoreRemoteDataSource::new(api, RetryPolicy::immediate(3))
}

/// Fresh in-memory cache
pub fn cache() -> Arc<dyn StoreCache> {
    Arc::new(SqliteStoreCache::in_memory().unwrap())
}
