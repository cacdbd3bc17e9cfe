//! Place directory collaborator: geocoding and nearby-venue search.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Place;

/// An external directory of venues (2GIS, OSM Nominatim, Google
/// Places, ...). Providers may return overlapping results across
/// repeated calls with different radii; callers must deduplicate by
/// place id.
#[async_trait]
pub trait PlaceDirectory: Send + Sync {
    /// Resolve a free-form address to coordinates.
    async fn geocode(&self, address: &str) -> Result<Option<(f64, f64)>>;

    /// Venues within `radius_m` meters of a point, up to `limit`.
    async fn search_nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Place>>;
}
