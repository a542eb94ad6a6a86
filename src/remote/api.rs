// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Store API surface and its HTTP implementation

use crate::error::{ApiError, ErrorBody};
use crate::types::{Menu, Store, StoreDetail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Path prefix shared by every endpoint
pub const API_PREFIX: &str = "api/v1";

/// One page of a store listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorePage {
    /// Stores on this page, in server order
    #[serde(default)]
    pub content: Vec<Store>,
    /// Zero-based page index
    #[serde(default)]
    pub page: u32,
    /// Requested page size
    #[serde(default)]
    pub size: u32,
    /// Whether this is the final page
    #[serde(default)]
    pub last: bool,
}

/// Remote store endpoints; one method per endpoint, one request per call
#[async_trait]
pub trait StoreApi: Send + Sync {
    /// `GET /stores` with filter and paging parameters
    async fn get_stores(&self, params: &[(&'static str, String)]) -> Result<StorePage, ApiError>;

    /// `GET /stores/{id}` with distance computed from the given position
    async fn get_store(&self, id: &str, latitude: f64, longitude: f64) -> Result<Store, ApiError>;

    /// `GET /stores/{id}/detail`
    async fn get_store_detail(&self, id: &str) -> Result<StoreDetail, ApiError>;

    /// `GET /stores/{id}/menus`
    async fn get_store_menus(&self, id: &str) -> Result<Vec<Menu>, ApiError>;

    /// `GET /stores/count`
    async fn get_store_count(&self) -> Result<i64, ApiError>;

    /// `GET /time`
    async fn get_sync_time(&self) -> Result<DateTime<Utc>, ApiError>;
}

/// [`StoreApi`] over HTTP with reqwest
#[derive(Debug, Clone)]
pub struct HttpStoreApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStoreApi {
    /// Client for `base_url` (e.g. `https://api.example.com`) with a request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ongi/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Wrap an existing client
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::trace!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(classify)?;

        if !status.is_success() {
            let body = serde_json::from_slice::<ErrorBody>(&bytes).unwrap_or_else(|_| ErrorBody {
                status: status.as_u16(),
                error: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
                message: String::from_utf8_lossy(&bytes).trim().to_string(),
                path: format!("/{API_PREFIX}/{path}"),
                time_stamp: Utc::now(),
            });
            return Err(ApiError::Server(body));
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(format!("{url}: {e}")))
    }
}

/// Map a reqwest failure onto the transient/permanent split
fn classify(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}

#[async_trait]
impl StoreApi for HttpStoreApi {
    async fn get_stores(&self, params: &[(&'static str, String)]) -> Result<StorePage, ApiError> {
        self.get_json("stores", params).await
    }

    async fn get_store(&self, id: &str, latitude: f64, longitude: f64) -> Result<Store, ApiError> {
        let query = [
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
        ];
        self.get_json(&format!("stores/{id}"), &query).await
    }

    async fn get_store_detail(&self, id: &str) -> Result<StoreDetail, ApiError> {
        self.get_json(&format!("stores/{id}/detail"), &[]).await
    }

    async fn get_store_menus(&self, id: &str) -> Result<Vec<Menu>, ApiError> {
        self.get_json(&format!("stores/{id}/menus"), &[]).await
    }

    async fn get_store_count(&self) -> Result<i64, ApiError> {
        self.get_json("stores/count", &[]).await
    }

    async fn get_sync_time(&self) -> Result<DateTime<Utc>, ApiError> {
        self.get_json("time", &[]).await
    }
}
