//! Domain data types for the menu-search pipeline.

pub mod menu;
pub mod place;

pub use menu::{DishMatch, FetchOutcome, MenuContent, MenuSource, PriceMatch};
pub use place::{DishSearchRequest, DishSearchResult, DishStatus, MenuItem, Place, SearchReport};
