// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! OnGi library - nearby store discovery core
//!
//! This crate provides the two halves of the OnGi application core: a
//! back-stack-per-tab navigation model, and an offline-first store repository
//! that pages a remote API into a local SQLite cache.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod error;
pub mod local;
pub mod navigation;
pub mod paging;
pub mod remote;
pub mod repository;
pub mod screen;

#[cfg(test)]
mod testing;

/// Core data types shared by the navigation and store layers
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use sha2::{Digest, Sha256};
    use std::fmt;

    // =========================================================================
    // Filter Enums
    // =========================================================================

    /// Store category used for filtering
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum StoreCategory {
        /// Korean restaurants
        KoreanFood,
        /// Western restaurants
        WesternFood,
        /// Japanese restaurants
        JapaneseFood,
        /// Chinese restaurants
        ChineseFood,
        /// Bakeries
        Bakery,
        /// Other restaurants
        Restaurant,
        /// Public baths
        BathHouse,
        /// Laundries
        Laundry,
        /// Hotels and lodging
        Hotel,
        /// Hair salons
        HairSalon,
        /// Anything else
        Etc,
        /// No category filter
        #[default]
        None,
    }

    impl StoreCategory {
        /// Every category, in display order
        pub const ALL: [Self; 12] = [
            Self::KoreanFood,
            Self::WesternFood,
            Self::JapaneseFood,
            Self::ChineseFood,
            Self::Bakery,
            Self::Restaurant,
            Self::BathHouse,
            Self::Laundry,
            Self::Hotel,
            Self::HairSalon,
            Self::Etc,
            Self::None,
        ];

        /// Wire code sent to the store API
        #[must_use]
        pub fn code(&self) -> &'static str {
            match self {
                Self::KoreanFood => "KOREAN_FOOD",
                Self::WesternFood => "WESTERN_FOOD",
                Self::JapaneseFood => "JAPANESE_FOOD",
                Self::ChineseFood => "CHINESE_FOOD",
                Self::Bakery => "BAKERY",
                Self::Restaurant => "RESTAURANT",
                Self::BathHouse => "BATH_HOUSE",
                Self::Laundry => "LAUNDRY",
                Self::Hotel => "HOTEL",
                Self::HairSalon => "HAIR_SALON",
                Self::Etc => "ETC",
                Self::None => "NONE",
            }
        }

        /// Parse a category from its wire code (case-insensitive)
        #[must_use]
        pub fn from_code(code: &str) -> Option<Self> {
            let upper = code.trim().to_uppercase().replace('-', "_");
            Self::ALL.into_iter().find(|c| c.code() == upper)
        }
    }

    /// Ordering of a store listing
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum StoreSortType {
        /// Alphabetical by name
        Name,
        /// Most favorited first
        #[default]
        Favorite,
        /// Nearest first
        Distance,
    }

    impl StoreSortType {
        /// Wire code sent to the store API
        #[must_use]
        pub fn code(&self) -> &'static str {
            match self {
                Self::Name => "NAME",
                Self::Favorite => "FAVORITE",
                Self::Distance => "DISTANCE",
            }
        }

        /// Parse a sort type from its wire code (case-insensitive)
        #[must_use]
        pub fn from_code(code: &str) -> Option<Self> {
            match code.trim().to_uppercase().as_str() {
                "NAME" => Some(Self::Name),
                "FAVORITE" => Some(Self::Favorite),
                "DISTANCE" => Some(Self::Distance),
                _ => None,
            }
        }
    }

    /// Search radius around the caller
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub enum StoreDistanceRange {
        /// 500 m
        #[serde(rename = "M_5")]
        M500,
        /// 1 km
        #[serde(rename = "K_1")]
        K1,
        /// 3 km
        #[serde(rename = "K_3")]
        K3,
        /// 5 km
        #[serde(rename = "K_5")]
        #[default]
        K5,
        /// 10 km
        #[serde(rename = "K_10")]
        K10,
        /// 15 km
        #[serde(rename = "K_15")]
        K15,
        /// Unbounded
        #[serde(rename = "NONE")]
        None,
    }

    impl StoreDistanceRange {
        /// Radius in kilometres, `None` when unbounded
        #[must_use]
        pub fn km(&self) -> Option<f64> {
            match self {
                Self::M500 => Some(0.5),
                Self::K1 => Some(1.0),
                Self::K3 => Some(3.0),
                Self::K5 => Some(5.0),
                Self::K10 => Some(10.0),
                Self::K15 => Some(15.0),
                Self::None => None,
            }
        }

        /// Short code used in canonical query keys and CLI flags
        #[must_use]
        pub fn code(&self) -> &'static str {
            match self {
                Self::M500 => "M_5",
                Self::K1 => "K_1",
                Self::K3 => "K_3",
                Self::K5 => "K_5",
                Self::K10 => "K_10",
                Self::K15 => "K_15",
                Self::None => "NONE",
            }
        }

        /// Smallest bounded range reaching `km`, unbounded past 15 km
        #[must_use]
        pub fn covering(km: f64) -> Self {
            [Self::M500, Self::K1, Self::K3, Self::K5, Self::K10, Self::K15]
                .into_iter()
                .find(|range| range.km().is_some_and(|limit| km <= limit))
                .unwrap_or(Self::None)
        }

        /// Parse a range from its code (`K_5`, `k5`, `none`, ...)
        #[must_use]
        pub fn from_code(code: &str) -> Option<Self> {
            match code.trim().to_uppercase().replace('_', "").as_str() {
                "M5" | "M500" => Some(Self::M500),
                "K1" => Some(Self::K1),
                "K3" => Some(Self::K3),
                "K5" => Some(Self::K5),
                "K10" => Some(Self::K10),
                "K15" => Some(Self::K15),
                "NONE" => Some(Self::None),
                _ => None,
            }
        }
    }

    // =========================================================================
    // Store Filter
    // =========================================================================

    /// User-facing filter for a store listing
    ///
    /// The default value is "no filter": no category, favorite ordering, a
    /// 5 km radius and an empty search query.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StoreFilter {
        /// Category restriction
        pub category: StoreCategory,
        /// Ordering
        pub sort_type: StoreSortType,
        /// Search radius
        pub distance_range: StoreDistanceRange,
        /// Free-text search
        pub search_query: String,
        /// Restrict to the user's favorites
        pub only_favorites: bool,
    }

    impl StoreFilter {
        /// Copy with a different category
        #[must_use]
        pub fn with_category(mut self, category: StoreCategory) -> Self {
            self.category = category;
            self
        }

        /// Copy with a different ordering
        #[must_use]
        pub fn with_sort_type(mut self, sort_type: StoreSortType) -> Self {
            self.sort_type = sort_type;
            self
        }

        /// Copy with a different radius
        #[must_use]
        pub fn with_distance_range(mut self, distance_range: StoreDistanceRange) -> Self {
            self.distance_range = distance_range;
            self
        }

        /// Copy with a different search query
        #[must_use]
        pub fn with_search_query(mut self, search_query: impl Into<String>) -> Self {
            self.search_query = search_query.into();
            self
        }

        /// Copy with the favorites-only flag set
        #[must_use]
        pub fn with_only_favorites(mut self, only_favorites: bool) -> Self {
            self.only_favorites = only_favorites;
            self
        }
    }

    // =========================================================================
    // Store Query
    // =========================================================================

    /// Geographic position in WGS84 degrees
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Coordinates {
        /// Latitude
        pub latitude: f64,
        /// Longitude
        pub longitude: f64,
    }

    impl Coordinates {
        /// Build a coordinate pair
        #[must_use]
        pub fn new(latitude: f64, longitude: f64) -> Self {
            Self { latitude, longitude }
        }

        /// Latitude and longitude at six decimals (about 0.1 m). Cache keys
        /// and remote requests both use this form.
        #[must_use]
        pub fn rounded(&self) -> (String, String) {
            (
                format!("{:.6}", self.latitude),
                format!("{:.6}", self.longitude),
            )
        }
    }

    /// Stable identifier correlating a query with its cached results
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct QueryId(pub String);

    impl QueryId {
        /// Borrow the raw identifier
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for QueryId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// One issued search/filter request
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StoreQuery {
        /// Filter applied to the listing
        pub filter: StoreFilter,
        /// Caller position used for distance filtering and ordering
        pub location: Coordinates,
        /// Rows per remote page
        pub page_size: u32,
    }

    impl StoreQuery {
        /// Default page size, matching the remote API's default
        pub const DEFAULT_PAGE_SIZE: u32 = 20;

        /// Build a query with the default page size
        #[must_use]
        pub fn new(filter: StoreFilter, location: Coordinates) -> Self {
            Self {
                filter,
                location,
                page_size: Self::DEFAULT_PAGE_SIZE,
            }
        }

        /// Copy with a different page size (at least 1)
        #[must_use]
        pub fn with_page_size(mut self, page_size: u32) -> Self {
            self.page_size = page_size.max(1);
            self
        }

        /// Canonical identity string: two queries are the same query iff
        /// their keys are equal
        #[must_use]
        pub fn canonical_key(&self) -> String {
            let f = &self.filter;
            let (lat, lon) = self.location.rounded();
            format!(
                "category={};sort={};distance={};q={};fav={};lat={lat};lon={lon};size={}",
                f.category.code(),
                f.sort_type.code(),
                f.distance_range.code(),
                f.search_query.trim(),
                f.only_favorites,
                self.page_size,
            )
        }

        /// Deterministic query identifier derived from the canonical key
        #[must_use]
        pub fn query_id(&self) -> QueryId {
            let mut hasher = Sha256::new();
            hasher.update(self.canonical_key().as_bytes());
            let hash = hex::encode(hasher.finalize());
            QueryId(format!("q:{}", &hash[..16]))
        }

        /// Remote query parameters for a given zero-based page
        #[must_use]
        pub fn to_query_params(&self, page: u32) -> Vec<(&'static str, String)> {
            let f = &self.filter;
            let mut params = Vec::with_capacity(9);
            if f.category != StoreCategory::None {
                params.push(("category", f.category.code().to_string()));
            }
            params.push(("sortType", f.sort_type.code().to_string()));
            if let Some(km) = f.distance_range.km() {
                params.push(("distance", km.to_string()));
            }
            let keyword = f.search_query.trim();
            if !keyword.is_empty() {
                params.push(("keyword", keyword.to_string()));
            }
            params.push(("onlyFavorites", f.only_favorites.to_string()));
            let (lat, lon) = self.location.rounded();
            params.push(("latitude", lat));
            params.push(("longitude", lon));
            params.push(("page", page.to_string()));
            params.push(("size", self.page_size.to_string()));
            params
        }
    }

    // =========================================================================
    // Store Records
    // =========================================================================

    /// A store as shown in listings
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Store {
        /// Unique identifier (UUID string on the server)
        pub id: String,
        /// Display name
        pub name: String,
        /// Category
        #[serde(default)]
        pub category: StoreCategory,
        /// Street address
        #[serde(default)]
        pub address: String,
        /// Contact phone
        #[serde(default)]
        pub phone: Option<String>,
        /// Latitude
        pub latitude: f64,
        /// Longitude
        pub longitude: f64,
        /// Distance from the query position, in kilometres
        #[serde(default)]
        pub distance: f64,
        /// Number of users who favorited this store
        #[serde(default)]
        pub favorite_count: i64,
        /// Thumbnail
        #[serde(default)]
        pub image_url: Option<String>,
    }

    impl Store {
        /// Copy with the favorite count moved by one in the given direction
        #[must_use]
        pub fn with_favorite_toggled(mut self, is_like: bool) -> Self {
            if is_like {
                self.favorite_count += 1;
            } else {
                self.favorite_count -= 1;
            }
            self
        }
    }

    /// Extended store information
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StoreDetail {
        /// Store identifier
        pub id: String,
        /// Free-form description
        #[serde(default)]
        pub description: String,
        /// Opening hours, as published by the store
        #[serde(default)]
        pub business_hours: Option<String>,
        /// Tags
        #[serde(default)]
        pub tags: Vec<String>,
    }

    /// One menu entry
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Menu {
        /// Dish or service name
        pub name: String,
        /// Price in won
        pub price: i64,
        /// Picture
        #[serde(default)]
        pub image_url: Option<String>,
    }

    /// Remote catalogue sync status
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StoreSync {
        /// Number of stores on the server
        pub store_count: i64,
        /// Last server-side sync
        pub sync_time: DateTime<Utc>,
    }

    /// A past search, most recent first when listed
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SearchHistory {
        /// Row identifier, used to delete one entry
        pub id: i64,
        /// Searched text
        pub keyword: String,
        /// Last time the text was searched
        pub searched_at: DateTime<Utc>,
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn seoul() -> Coordinates {
            Coordinates::new(37.5665, 126.978)
        }

        #[test]
        fn test_default_filter_is_no_filter() {
            let filter = StoreFilter::default();
            assert_eq!(filter.category, StoreCategory::None);
            assert_eq!(filter.sort_type, StoreSortType::Favorite);
            assert_eq!(filter.distance_range, StoreDistanceRange::K5);
            assert!(filter.search_query.is_empty());
            assert!(!filter.only_favorites);
        }

        #[test]
        fn test_query_id_determinism() {
            let a = StoreQuery::new(StoreFilter::default(), seoul());
            let b = StoreQuery::new(StoreFilter::default(), seoul());
            assert_eq!(a.query_id(), b.query_id());
            assert!(a.query_id().as_str().starts_with("q:"));
        }

        #[test]
        fn test_query_id_distinguishes_filters() {
            let a = StoreQuery::new(StoreFilter::default(), seoul());
            let b = StoreQuery::new(
                StoreFilter::default().with_category(StoreCategory::KoreanFood),
                seoul(),
            );
            let c = a.clone().with_page_size(10);
            assert_ne!(a.query_id(), b.query_id());
            assert_ne!(a.query_id(), c.query_id());
        }

        #[test]
        fn test_query_params_omit_unbounded_fields() {
            let query = StoreQuery::new(
                StoreFilter::default().with_distance_range(StoreDistanceRange::None),
                seoul(),
            );
            let params = query.to_query_params(2);
            let keys: Vec<_> = params.iter().map(|(k, _)| *k).collect();
            assert!(!keys.contains(&"category"));
            assert!(!keys.contains(&"distance"));
            assert!(!keys.contains(&"keyword"));
            assert!(params.contains(&("page", "2".to_string())));
        }

        #[test]
        fn test_nearby_positions_share_key_and_request() {
            let a = StoreQuery::new(StoreFilter::default(), seoul());
            let b = StoreQuery::new(
                StoreFilter::default(),
                Coordinates::new(37.566_500_000_4, 126.977_999_999_8),
            );
            assert_eq!(a.query_id(), b.query_id());
            assert_eq!(a.to_query_params(0), b.to_query_params(0));
            assert!(a
                .to_query_params(0)
                .contains(&("latitude", "37.566500".to_string())));
        }

        #[test]
        fn test_distance_range_covering() {
            assert_eq!(StoreDistanceRange::covering(0.2), StoreDistanceRange::M500);
            assert_eq!(StoreDistanceRange::covering(1.0), StoreDistanceRange::K1);
            assert_eq!(StoreDistanceRange::covering(4.2), StoreDistanceRange::K5);
            assert_eq!(StoreDistanceRange::covering(40.0), StoreDistanceRange::None);
        }

        #[test]
        fn test_codes_parse_back() {
            for category in StoreCategory::ALL {
                assert_eq!(StoreCategory::from_code(category.code()), Some(category));
            }
            assert_eq!(StoreDistanceRange::from_code("k_10"), Some(StoreDistanceRange::K10));
            assert_eq!(StoreSortType::from_code("distance"), Some(StoreSortType::Distance));
        }

        #[test]
        fn test_distance_range_serializes_with_wire_names() {
            let json = serde_json::to_string(&StoreDistanceRange::M500).unwrap();
            assert_eq!(json, "\"M_5\"");
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{OngiError, Result};
    pub use crate::types::*;
}
