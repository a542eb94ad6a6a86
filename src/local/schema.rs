// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! SQL schema and statements for the store cache

/// Default database file name inside the data directory
pub const STORE_DB_NAME: &str = "ongi.db";

/// Tables: issued queries, stores, the ordered query → store listing, the
/// user's liked stores and past searches.
///
/// `last_used_at` and `seq` are monotonic counters rather than wall clocks so
/// that recency survives clock adjustments. `store_like` has no foreign key:
/// a like outlives eviction of the store row it was made on.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS store_query (
    id            TEXT PRIMARY KEY,
    query_key     TEXT NOT NULL UNIQUE,
    params        TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    last_used_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    category        TEXT NOT NULL,
    address         TEXT NOT NULL,
    phone           TEXT,
    latitude        REAL NOT NULL,
    longitude       REAL NOT NULL,
    distance        REAL NOT NULL,
    favorite_count  INTEGER NOT NULL,
    image_url       TEXT
);

CREATE TABLE IF NOT EXISTS store_query_item (
    query_id  TEXT NOT NULL REFERENCES store_query(id) ON DELETE CASCADE,
    position  INTEGER NOT NULL,
    store_id  TEXT NOT NULL REFERENCES store(id),
    PRIMARY KEY (query_id, position)
);

CREATE TABLE IF NOT EXISTS store_like (
    store_id  TEXT PRIMARY KEY,
    liked_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS search_history (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword      TEXT NOT NULL UNIQUE,
    searched_at  TEXT NOT NULL,
    seq          INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_store_query_item_store ON store_query_item(store_id);
CREATE INDEX IF NOT EXISTS idx_store_query_last_used ON store_query(last_used_at);
";

pub(crate) const UPSERT_QUERY: &str = "
INSERT INTO store_query (id, query_key, params, created_at, last_used_at)
VALUES (?1, ?2, ?3, ?4, (SELECT COALESCE(MAX(last_used_at), 0) + 1 FROM store_query))
ON CONFLICT(id) DO UPDATE SET last_used_at = excluded.last_used_at";

pub(crate) const UPSERT_STORE: &str = "
INSERT INTO store (id, name, category, address, phone, latitude, longitude, distance, favorite_count, image_url)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    category = excluded.category,
    address = excluded.address,
    phone = excluded.phone,
    latitude = excluded.latitude,
    longitude = excluded.longitude,
    distance = excluded.distance,
    favorite_count = excluded.favorite_count,
    image_url = excluded.image_url";

pub(crate) const UPDATE_STORE: &str = "
UPDATE store SET
    name = ?2, category = ?3, address = ?4, phone = ?5, latitude = ?6,
    longitude = ?7, distance = ?8, favorite_count = ?9, image_url = ?10
WHERE id = ?1";

pub(crate) const SELECT_STORE_COLUMNS: &str =
    "s.id, s.name, s.category, s.address, s.phone, s.latitude, s.longitude, s.distance, s.favorite_count, s.image_url";

pub(crate) const CLEAR_QUERY_ITEMS: &str = "DELETE FROM store_query_item WHERE query_id = ?1";

pub(crate) const NEXT_POSITION: &str =
    "SELECT COALESCE(MAX(position) + 1, 0) FROM store_query_item WHERE query_id = ?1";

pub(crate) const INSERT_QUERY_ITEM: &str =
    "INSERT INTO store_query_item (query_id, position, store_id) VALUES (?1, ?2, ?3)";

pub(crate) const COUNT_QUERY_ITEMS: &str = "SELECT COUNT(*) FROM store_query_item WHERE query_id = ?1";

pub(crate) const QUERY_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM store_query WHERE id = ?1)";

pub(crate) const PRUNE_QUERIES: &str = "
DELETE FROM store_query WHERE id NOT IN (
    SELECT id FROM store_query ORDER BY last_used_at DESC LIMIT ?1
)";

pub(crate) const PRUNE_ORPHAN_STORES: &str =
    "DELETE FROM store WHERE id NOT IN (SELECT store_id FROM store_query_item)";

pub(crate) const IS_LIKED: &str = "SELECT EXISTS(SELECT 1 FROM store_like WHERE store_id = ?1)";

pub(crate) const INSERT_LIKE: &str =
    "INSERT OR IGNORE INTO store_like (store_id, liked_at) VALUES (?1, ?2)";

pub(crate) const DELETE_LIKE: &str = "DELETE FROM store_like WHERE store_id = ?1";

pub(crate) const UPSERT_SEARCH: &str = "
INSERT INTO search_history (keyword, searched_at, seq)
VALUES (?1, ?2, (SELECT COALESCE(MAX(seq), 0) + 1 FROM search_history))
ON CONFLICT(keyword) DO UPDATE SET searched_at = excluded.searched_at, seq = excluded.seq";

pub(crate) const SELECT_SEARCHES: &str =
    "SELECT id, keyword, searched_at FROM search_history ORDER BY seq DESC LIMIT ?1";

pub(crate) const DELETE_SEARCH: &str = "DELETE FROM search_history WHERE id = ?1";

pub(crate) const CLEAR_SEARCHES: &str = "DELETE FROM search_history";
