// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Device location port

use crate::error::LocationError;
use crate::types::Coordinates;
use async_trait::async_trait;

/// Fallback position when the device cannot report one
pub const SEOUL_CITY_HALL: Coordinates = Coordinates {
    latitude: 37.5665,
    longitude: 126.978,
};

/// Source of the device position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Current position
    async fn current_location(&self) -> Result<Coordinates, LocationError>;
}

/// Provider that always answers with one outcome
#[derive(Debug, Clone)]
pub struct FixedLocation(pub Result<Coordinates, LocationError>);

impl FixedLocation {
    /// Always at `coordinates`
    #[must_use]
    pub fn at(coordinates: Coordinates) -> Self {
        Self(Ok(coordinates))
    }

    /// Always failing with `err`
    #[must_use]
    pub fn failing(err: LocationError) -> Self {
        Self(Err(err))
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        self.0.clone()
    }
}

/// Ask `provider` for a position, falling back to `fallback` on failure.
/// The failure, if any, is returned next to the position used.
pub async fn resolve(
    provider: &dyn LocationProvider,
    fallback: Coordinates,
) -> (Coordinates, Option<LocationError>) {
    match provider.current_location().await {
        Ok(position) => (position, None),
        Err(err) => {
            tracing::warn!(error = %err, "using default location");
            (fallback, Some(err))
        }
    }
}
