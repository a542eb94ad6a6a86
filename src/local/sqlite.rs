// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! SQLite implementation of [`StoreCache`]

use super::schema;
use super::{PruneReport, StoreCache, StoresWithQuery, WriteMode};
use crate::error::CacheError;
use crate::types::{QueryId, SearchHistory, Store, StoreCategory, StoreQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Store cache backed by one SQLite connection.
///
/// Statements run on the blocking pool; the connection is shared behind a
/// mutex so clones of the cache serialise their writes.
#[derive(Debug, Clone)]
pub struct SqliteStoreCache {
    conn: Arc<Mutex<Connection>>,
    changes: Arc<watch::Sender<u64>>,
}

impl SqliteStoreCache {
    /// Open (or create) the cache at `path`
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;
        tracing::debug!(path = %path.display(), "opened store cache");
        Self::init(conn)
    }

    /// Fresh cache living only in memory
    pub fn in_memory() -> Result<Self, CacheError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, CacheError> {
        conn.execute("PRAGMA foreign_keys=ON;", [])?;
        conn.execute_batch(schema::SCHEMA)?;
        let (changes, _) = watch::channel(0);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            changes: Arc::new(changes),
        })
    }

    async fn with_conn<T, F>(&self, op: &'static str, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, CacheError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| CacheError::Task(format!("{op}: connection lock poisoned")))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| CacheError::Task(format!("{op}: {e}")))?
    }

    fn bump(&self) {
        self.changes.send_modify(|n| *n = n.wrapping_add(1));
    }
}

fn store_from_row(row: &Row<'_>) -> rusqlite::Result<Store> {
    let code: String = row.get(2)?;
    let category = StoreCategory::from_code(&code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            Box::new(CacheError::Serde(format!("unknown category {code:?}"))),
        )
    })?;
    Ok(Store {
        id: row.get(0)?,
        name: row.get(1)?,
        category,
        address: row.get(3)?,
        phone: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        distance: row.get(7)?,
        favorite_count: row.get(8)?,
        image_url: row.get(9)?,
    })
}

fn search_from_row(row: &Row<'_>) -> rusqlite::Result<SearchHistory> {
    let raw: String = row.get(2)?;
    let searched_at = DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);
    Ok(SearchHistory {
        id: row.get(0)?,
        keyword: row.get(1)?,
        searched_at,
    })
}

fn write_store(conn: &Connection, sql: &str, store: &Store) -> rusqlite::Result<usize> {
    conn.execute(
        sql,
        params![
            store.id,
            store.name,
            store.category.code(),
            store.address,
            store.phone,
            store.latitude,
            store.longitude,
            store.distance,
            store.favorite_count,
            store.image_url,
        ],
    )
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl StoreCache for SqliteStoreCache {
    async fn upsert_query(&self, query: &StoreQuery) -> Result<QueryId, CacheError> {
        let id = query.query_id();
        let key = query.canonical_key();
        let params_json =
            serde_json::to_string(query).map_err(|e| CacheError::Serde(e.to_string()))?;
        let created_at = Utc::now().to_rfc3339();

        let query_id = id.clone();
        self.with_conn("upsert_query", move |conn| {
            conn.execute(
                schema::UPSERT_QUERY,
                params![query_id.as_str(), key, params_json, created_at],
            )?;
            Ok(())
        })
        .await?;

        tracing::debug!(query_id = %id, "upserted store query");
        self.bump();
        Ok(id)
    }

    async fn write_page(
        &self,
        query_id: &QueryId,
        stores: &[Store],
        mode: WriteMode,
    ) -> Result<(), CacheError> {
        let query_id = query_id.clone();
        let stores = stores.to_vec();
        let rows = stores.len();

        let qid = query_id.clone();
        self.with_conn("write_page", move |conn| {
            let tx = conn.transaction()?;
            let start: i64 = match mode {
                WriteMode::Replace => {
                    tx.execute(schema::CLEAR_QUERY_ITEMS, params![qid.as_str()])?;
                    0
                }
                WriteMode::Append => {
                    tx.query_row(schema::NEXT_POSITION, params![qid.as_str()], |r| r.get(0))?
                }
            };
            for (offset, store) in stores.iter().enumerate() {
                write_store(&tx, schema::UPSERT_STORE, store)?;
                tx.execute(
                    schema::INSERT_QUERY_ITEM,
                    params![qid.as_str(), start + to_i64(offset), store.id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await?;

        tracing::debug!(query_id = %query_id, ?mode, rows, "wrote store page");
        self.bump();
        Ok(())
    }

    async fn query_item_count(&self, query_id: &QueryId) -> Result<usize, CacheError> {
        let qid = query_id.clone();
        let count: i64 = self
            .with_conn("query_item_count", move |conn| {
                Ok(conn.query_row(schema::COUNT_QUERY_ITEMS, params![qid.as_str()], |r| {
                    r.get(0)
                })?)
            })
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn stores_by_query(
        &self,
        query_id: &QueryId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Store>, CacheError> {
        let qid = query_id.clone();
        self.with_conn("stores_by_query", move |conn| {
            let sql = format!(
                "SELECT {} FROM store_query_item i JOIN store s ON s.id = i.store_id \
                 WHERE i.query_id = ?1 ORDER BY i.position LIMIT ?2 OFFSET ?3",
                schema::SELECT_STORE_COLUMNS
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt
                .query_map(
                    params![qid.as_str(), to_i64(limit), to_i64(offset)],
                    store_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn top_stores(
        &self,
        query_id: &QueryId,
        limit: usize,
    ) -> Result<Option<StoresWithQuery>, CacheError> {
        let qid = query_id.clone();
        let exists: bool = self
            .with_conn("top_stores", move |conn| {
                Ok(conn.query_row(schema::QUERY_EXISTS, params![qid.as_str()], |r| r.get(0))?)
            })
            .await?;
        if !exists {
            return Ok(None);
        }
        let stores = self.stores_by_query(query_id, 0, limit).await?;
        Ok(Some(StoresWithQuery {
            query_id: query_id.clone(),
            stores,
        }))
    }

    async fn get_store(&self, id: &str) -> Result<Option<Store>, CacheError> {
        let id = id.to_string();
        self.with_conn("get_store", move |conn| {
            let sql = format!(
                "SELECT {} FROM store s WHERE s.id = ?1",
                schema::SELECT_STORE_COLUMNS
            );
            Ok(conn
                .query_row(&sql, params![id], store_from_row)
                .optional()?)
        })
        .await
    }

    async fn update_store(&self, store: &Store) -> Result<(), CacheError> {
        let store = store.clone();
        let id = store.id.clone();
        let updated = self
            .with_conn("update_store", move |conn| {
                Ok(write_store(conn, schema::UPDATE_STORE, &store)?)
            })
            .await?;
        if updated == 0 {
            return Err(CacheError::StoreNotFound(id));
        }
        tracing::debug!(store_id = %id, "updated cached store");
        self.bump();
        Ok(())
    }

    async fn is_liked(&self, id: &str) -> Result<bool, CacheError> {
        let id = id.to_string();
        self.with_conn("is_liked", move |conn| {
            Ok(conn.query_row(schema::IS_LIKED, params![id], |r| r.get(0))?)
        })
        .await
    }

    async fn set_liked(&self, store: &Store, liked: bool) -> Result<(), CacheError> {
        let store = store.clone();
        let id = store.id.clone();
        let liked_at = Utc::now().to_rfc3339();
        let updated = self
            .with_conn("set_liked", move |conn| {
                let tx = conn.transaction()?;
                let updated = write_store(&tx, schema::UPDATE_STORE, &store)?;
                if updated == 0 {
                    return Ok(0);
                }
                if liked {
                    tx.execute(schema::INSERT_LIKE, params![store.id, liked_at])?;
                } else {
                    tx.execute(schema::DELETE_LIKE, params![store.id])?;
                }
                tx.commit()?;
                Ok(updated)
            })
            .await?;
        if updated == 0 {
            return Err(CacheError::StoreNotFound(id));
        }
        tracing::debug!(store_id = %id, liked, "stored like state");
        self.bump();
        Ok(())
    }

    async fn add_search(&self, keyword: &str) -> Result<(), CacheError> {
        let keyword = keyword.trim().to_string();
        if keyword.is_empty() {
            return Ok(());
        }
        let searched_at = Utc::now().to_rfc3339();
        self.with_conn("add_search", move |conn| {
            conn.execute(schema::UPSERT_SEARCH, params![keyword, searched_at])?;
            Ok(())
        })
        .await
    }

    async fn searches(&self, limit: usize) -> Result<Vec<SearchHistory>, CacheError> {
        self.with_conn("searches", move |conn| {
            let mut stmt = conn.prepare_cached(schema::SELECT_SEARCHES)?;
            let rows = stmt
                .query_map(params![to_i64(limit)], search_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn delete_search(&self, id: i64) -> Result<(), CacheError> {
        self.with_conn("delete_search", move |conn| {
            conn.execute(schema::DELETE_SEARCH, params![id])?;
            Ok(())
        })
        .await
    }

    async fn clear_searches(&self) -> Result<(), CacheError> {
        let removed = self
            .with_conn("clear_searches", move |conn| {
                Ok(conn.execute(schema::CLEAR_SEARCHES, [])?)
            })
            .await?;
        tracing::debug!(removed, "cleared search history");
        Ok(())
    }

    async fn prune_queries(&self, keep: usize) -> Result<PruneReport, CacheError> {
        let report = self
            .with_conn("prune_queries", move |conn| {
                let tx = conn.transaction()?;
                let queries_removed = tx.execute(schema::PRUNE_QUERIES, params![to_i64(keep)])?;
                let stores_removed = tx.execute(schema::PRUNE_ORPHAN_STORES, [])?;
                tx.commit()?;
                Ok(PruneReport {
                    queries_removed,
                    stores_removed,
                })
            })
            .await?;
        if report != PruneReport::default() {
            tracing::debug!(
                keep,
                queries = report.queries_removed,
                stores = report.stores_removed,
                "pruned store cache"
            );
            self.bump();
        }
        Ok(report)
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coordinates, StoreFilter};

    fn store(id: &str, favorites: i64) -> Store {
        Store {
            id: id.to_string(),
            name: format!("Store {id}"),
            category: StoreCategory::Restaurant,
            address: "Seoul".to_string(),
            phone: None,
            latitude: 37.5,
            longitude: 127.0,
            distance: 0.3,
            favorite_count: favorites,
            image_url: None,
        }
    }

    fn query(keyword: &str) -> StoreQuery {
        StoreQuery::new(
            StoreFilter::default().with_search_query(keyword),
            Coordinates::new(37.5665, 126.978),
        )
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let cache = SqliteStoreCache::in_memory().unwrap();
        let a = cache.upsert_query(&query("kimbap")).await.unwrap();
        let b = cache.upsert_query(&query("kimbap")).await.unwrap();
        let c = cache.upsert_query(&query("tteok")).await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_replace_then_append_preserves_order() {
        let cache = SqliteStoreCache::in_memory().unwrap();
        let id = cache.upsert_query(&query("")).await.unwrap();

        cache
            .write_page(&id, &[store("b", 0), store("a", 0)], WriteMode::Replace)
            .await
            .unwrap();
        cache
            .write_page(&id, &[store("c", 0)], WriteMode::Append)
            .await
            .unwrap();
        let ids: Vec<_> = cache
            .stores_by_query(&id, 0, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["b", "a", "c"]);

        cache
            .write_page(&id, &[store("z", 0)], WriteMode::Replace)
            .await
            .unwrap();
        assert_eq!(cache.query_item_count(&id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_top_stores_for_unknown_query_is_none() {
        let cache = SqliteStoreCache::in_memory().unwrap();
        let missing = query("nowhere").query_id();
        assert!(cache.top_stores(&missing, 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_store_fails() {
        let cache = SqliteStoreCache::in_memory().unwrap();
        let err = cache.update_store(&store("ghost", 1)).await.unwrap_err();
        assert!(matches!(err, CacheError::StoreNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_prune_keeps_most_recent_queries() {
        let cache = SqliteStoreCache::in_memory().unwrap();
        let old = cache.upsert_query(&query("old")).await.unwrap();
        cache
            .write_page(&old, &[store("only-old", 0)], WriteMode::Replace)
            .await
            .unwrap();
        let recent = cache.upsert_query(&query("recent")).await.unwrap();
        cache
            .write_page(&recent, &[store("shared", 0)], WriteMode::Replace)
            .await
            .unwrap();

        let report = cache.prune_queries(1).await.unwrap();
        assert_eq!(report.queries_removed, 1);
        assert_eq!(report.stores_removed, 1);
        assert!(cache.top_stores(&old, 10).await.unwrap().is_none());
        assert!(cache.get_store("only-old").await.unwrap().is_none());
        assert!(cache.get_store("shared").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_touching_a_query_refreshes_recency() {
        let cache = SqliteStoreCache::in_memory().unwrap();
        let first = cache.upsert_query(&query("first")).await.unwrap();
        cache.upsert_query(&query("second")).await.unwrap();
        cache.upsert_query(&query("first")).await.unwrap();

        cache.prune_queries(1).await.unwrap();
        assert!(cache.top_stores(&first, 1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_writes_bump_change_counter() {
        let cache = SqliteStoreCache::in_memory().unwrap();
        let rx = cache.changes();
        let before = *rx.borrow();
        let id = cache.upsert_query(&query("")).await.unwrap();
        cache
            .write_page(&id, &[store("a", 0)], WriteMode::Replace)
            .await
            .unwrap();
        assert_eq!(*rx.borrow(), before + 2);
    }

    #[tokio::test]
    async fn test_like_survives_eviction_of_its_store() {
        let cache = SqliteStoreCache::in_memory().unwrap();
        let id = cache.upsert_query(&query("")).await.unwrap();
        cache
            .write_page(&id, &[store("a", 3)], WriteMode::Replace)
            .await
            .unwrap();

        cache.set_liked(&store("a", 4), true).await.unwrap();
        assert!(cache.is_liked("a").await.unwrap());
        assert_eq!(cache.get_store("a").await.unwrap().unwrap().favorite_count, 4);

        cache.prune_queries(0).await.unwrap();
        assert!(cache.get_store("a").await.unwrap().is_none());
        assert!(cache.is_liked("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_like_on_missing_store_changes_nothing() {
        let cache = SqliteStoreCache::in_memory().unwrap();
        let err = cache.set_liked(&store("ghost", 1), true).await.unwrap_err();
        assert!(matches!(err, CacheError::StoreNotFound(_)));
        assert!(!cache.is_liked("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_history_is_most_recent_first() {
        let cache = SqliteStoreCache::in_memory().unwrap();
        for keyword in ["kimbap", "bakery", "  ", "kimbap"] {
            cache.add_search(keyword).await.unwrap();
        }
        let history = cache.searches(10).await.unwrap();
        let keywords: Vec<_> = history.iter().map(|h| h.keyword.as_str()).collect();
        assert_eq!(keywords, ["kimbap", "bakery"]);

        cache.delete_search(history[0].id).await.unwrap();
        assert_eq!(cache.searches(10).await.unwrap().len(), 1);
        cache.clear_searches().await.unwrap();
        assert!(cache.searches(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ongi.db");
        let cache = SqliteStoreCache::open(&path).unwrap();
        cache.upsert_query(&query("")).await.unwrap();
        assert!(path.exists());
    }
}
