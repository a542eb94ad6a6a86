// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! End-to-end sync tests: HTTP store API -> retrying source -> SQLite cache
//!
//! A wiremock server stands in for the store API; the cache is a real
//! SQLite file in a temporary directory.

use ongi::error::{ApiError, OngiError};
use ongi::local::{SqliteStoreCache, StoreCache};
use ongi::paging::LoadState;
use ongi::remote::{HttpStoreApi, RetryPolicy, StoreRemoteDataSource};
use ongi::repository::{CachedStoreRepository, StoreRepository};
use ongi::types::{Coordinates, StoreFilter, StoreQuery};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

fn store_json(id: &str, favorite_count: i64) -> Value {
    json!({
        "id": id,
        "name": format!("Store {id}"),
        "category": "KOREAN_FOOD",
        "address": "110 Sejong-daero",
        "phone": "02-120",
        "latitude": 37.5665,
        "longitude": 126.978,
        "distance": 0.3,
        "favoriteCount": favorite_count
    })
}

fn page_json(ids: &[&str], page: u32, size: u32, last: bool) -> Value {
    json!({
        "content": ids.iter().map(|id| store_json(id, 5)).collect::<Vec<_>>(),
        "page": page,
        "size": size,
        "last": last
    })
}

fn query(page_size: u32) -> StoreQuery {
    StoreQuery::new(StoreFilter::default(), Coordinates::new(37.5665, 126.978))
        .with_page_size(page_size)
}

fn source(server: &MockServer, timeout: Duration) -> StoreRemoteDataSource {
    let api = HttpStoreApi::new(server.uri(), timeout).unwrap();
    StoreRemoteDataSource::new(Arc::new(api), RetryPolicy::immediate(3))
}

fn repository(server: &MockServer, dir: &TempDir) -> CachedStoreRepository {
    let cache = SqliteStoreCache::open(&dir.path().join("ongi.db")).unwrap();
    CachedStoreRepository::new(source(server, Duration::from_secs(5)), Arc::new(cache))
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test]
async fn test_two_timeouts_then_success() {
    let server = MockServer::start().await;

    // Mounted first, so it answers the first two requests (too slowly)
    Mock::given(method("GET"))
        .and(path("/api/v1/stores"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(&["a"], 0, 20, true))
                .set_delay(Duration::from_millis(500)),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["a", "b"], 0, 20, true)))
        .expect(1)
        .mount(&server)
        .await;

    let source = source(&server, Duration::from_millis(100));
    let page = source.get_stores(&query(20), 0).await.unwrap();
    assert_eq!(page.content.len(), 2);
    assert!(page.last);
}

#[tokio::test]
async fn test_not_found_is_parsed_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stores/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": 404,
            "error": "STORE_NOT_FOUND",
            "message": "store missing does not exist",
            "path": "/api/v1/stores/missing",
            "timeStamp": "2025-05-01T09:30:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let repo = repository(&server, &dir);
    let body = match repo.get_store("missing", 37.5, 127.0).await.unwrap_err() {
        OngiError::Api(ApiError::Server(body)) => body,
        other => panic!("expected a server error, got {other:?}"),
    };
    assert_eq!(body.status, 404);
    assert_eq!(body.error, "STORE_NOT_FOUND");
    assert_eq!(body.path, "/api/v1/stores/missing");
}

#[tokio::test]
async fn test_unparseable_error_body_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stores/count"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let body = match repository(&server, &dir).get_store_count().await.unwrap_err() {
        OngiError::Api(ApiError::Server(body)) => body,
        other => panic!("expected a server error, got {other:?}"),
    };
    assert_eq!(body.status, 503);
    assert_eq!(body.message, "upstream down");
}

// =============================================================================
// Cache Sync
// =============================================================================

#[tokio::test]
async fn test_refresh_keeps_server_order_and_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stores"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["c", "a", "b"], 0, 3, false)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let repo = repository(&server, &dir);
    let query = query(3);

    let first = repo.get_store_list(&query).await.unwrap();
    let second = repo.get_store_list(&query).await.unwrap();

    let ids: Vec<&str> = first.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert_eq!(first, second);
    assert_eq!(repo.cache().query_item_count(&query.query_id()).await.unwrap(), 3);
}

#[tokio::test]
async fn test_pager_appends_until_last_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stores"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["a", "b"], 0, 2, false)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stores"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["c"], 1, 2, true)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let repo = repository(&server, &dir);
    let pager = repo.get_store_stream(&query(2)).await.unwrap();

    pager.refresh().await.unwrap();
    assert_eq!(pager.snapshot().items.len(), 2);
    assert!(!pager.snapshot().end_of_pagination);

    assert!(pager.load_more().await.unwrap());
    assert!(!pager.load_more().await.unwrap());

    let snapshot = pager.snapshot();
    let ids: Vec<&str> = snapshot.items.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(snapshot.end_of_pagination);
    assert_eq!(snapshot.append, LoadState::NotLoading);
}

#[tokio::test]
async fn test_favorite_changes_survive_reopen() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["a"], 0, 20, true)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    {
        let repo = repository(&server, &dir);
        repo.get_store_list(&query(20)).await.unwrap();
        let liked = repo.update_store_favorite_count("a", true).await.unwrap();
        assert_eq!(liked.favorite_count, 6);
        let liked_again = repo.update_store_favorite_count("a", true).await.unwrap();
        assert_eq!(liked_again.favorite_count, 7);
        repo.update_store_favorite_count("a", false).await.unwrap();
    }

    let reopened = SqliteStoreCache::open(&dir.path().join("ongi.db")).unwrap();
    let store = reopened.get_store("a").await.unwrap().unwrap();
    assert_eq!(store.favorite_count, 6);
}

#[tokio::test]
async fn test_failed_refresh_leaves_cache_intact() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&["a", "b"], 0, 20, true)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stores"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let repo = repository(&server, &dir);
    let query = query(20);
    assert_eq!(repo.get_store_list(&query).await.unwrap().len(), 2);

    let pager = repo.get_store_stream(&query).await.unwrap();
    assert!(pager.refresh().await.is_err());

    // Stale rows stay visible and the failure is reported on the snapshot
    let snapshot = pager.snapshot();
    assert_eq!(snapshot.items.len(), 2);
    assert!(matches!(snapshot.refresh, LoadState::Error(_)));
    assert_eq!(repo.cache().query_item_count(&query.query_id()).await.unwrap(), 2);
}
