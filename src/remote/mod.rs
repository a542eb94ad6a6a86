// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Remote store API access

pub mod api;
pub mod retry;
pub mod source;

pub use api::{HttpStoreApi, StoreApi, StorePage, API_PREFIX};
pub use retry::RetryPolicy;
pub use source::StoreRemoteDataSource;
