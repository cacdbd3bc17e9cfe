//! Places, search requests, and the public result types.

use serde::{Deserialize, Serialize};

use super::menu::MenuSource;

/// A restaurant (or similar venue) returned by the place directory.
///
/// Immutable once returned; deduplicated by `id` within one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Directory-unique identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Address string as the directory formats it.
    pub address: String,

    /// Latitude.
    pub lat: f64,

    /// Longitude.
    pub lon: f64,

    /// Website when the directory already knows it.
    pub website: Option<String>,
}

impl Place {
    /// Create a place without a known website.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        lat: f64,
        lon: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            lat,
            lon,
            website: None,
        }
    }

    /// Attach a known website.
    pub fn with_website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }
}

/// Lifecycle status of one (place, dish) search.
///
/// Ordered by increasing success so callers can rank results:
/// `SiteNotFound < MenuUnavailable < FoundNoPrice < Found`.
/// `Pending` is the only non-terminal value and never appears in a
/// result returned to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DishStatus {
    /// Restaurant website could not be resolved.
    SiteNotFound,
    /// Site found but no usable menu, or the dish was not in it.
    MenuUnavailable,
    /// Dish found, price not discoverable.
    FoundNoPrice,
    /// Dish found with a price.
    Found,
    /// Not yet processed; internal only.
    Pending,
}

impl DishStatus {
    /// True for `Found` and `FoundNoPrice`.
    pub fn is_found(&self) -> bool {
        matches!(self, DishStatus::Found | DishStatus::FoundNoPrice)
    }
}

/// A menu item reconstructed around a dish match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Best-effort dish label from the menu text.
    pub name: String,

    /// Extracted price, currency-agnostic.
    pub price: Option<f64>,

    /// Exact substring the price came from.
    pub price_raw: Option<String>,
}

/// The public unit of work result: one place, one dish, one verdict.
///
/// Created once per (place, dish) pair per search and never mutated
/// afterwards; the orchestrator only appends to result lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishSearchResult {
    /// The place that was checked.
    pub place: Place,

    /// Terminal lifecycle status.
    pub status: DishStatus,

    /// Menu URL when one was located.
    pub menu_url: Option<String>,

    /// Matched item when the dish was found.
    pub menu_item: Option<MenuItem>,

    /// Which strategy produced the menu text.
    pub menu_source: Option<MenuSource>,

    /// Human-readable error or skip reason.
    pub error_message: Option<String>,
}

impl DishSearchResult {
    /// Result for a place whose website could not be resolved.
    pub fn site_not_found(place: Place) -> Self {
        Self {
            place,
            status: DishStatus::SiteNotFound,
            menu_url: None,
            menu_item: None,
            menu_source: None,
            error_message: None,
        }
    }

    /// Result for a place whose menu could not be used.
    pub fn menu_unavailable(place: Place, reason: impl Into<String>) -> Self {
        Self {
            place,
            status: DishStatus::MenuUnavailable,
            menu_url: None,
            menu_item: None,
            menu_source: None,
            error_message: Some(reason.into()),
        }
    }
}

/// Parameters for one progressive-radius search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishSearchRequest {
    /// Dish to look for.
    pub dish_name: String,

    /// Search origin latitude.
    pub lat: f64,

    /// Search origin longitude.
    pub lon: f64,
}

impl DishSearchRequest {
    /// Create a request.
    pub fn new(dish_name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            dish_name: dish_name.into(),
            lat,
            lon,
        }
    }
}

/// Final aggregate of one search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchReport {
    /// Results with status `Found` or `FoundNoPrice`, in completion
    /// order (not distance order).
    pub found: Vec<DishSearchResult>,

    /// Checked places where the dish was not found.
    pub checked_not_found: Vec<DishSearchResult>,

    /// Subset of not-found places whose menu looked image-based:
    /// automated matching likely missed a real menu, worth offering
    /// as links to browse manually.
    pub image_menu_suspects: Vec<DishSearchResult>,

    /// Places actually dispatched to the matcher.
    pub checked_count: usize,

    /// Radius at which the search stopped, in meters.
    pub final_radius_m: u32,
}
