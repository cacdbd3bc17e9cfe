//! Restaurant Menu Discovery and Dish Matching
//!
//! A pipeline that answers one question: *"who near me serves this
//! dish, and for how much?"* Given a dish name and a location, it
//! finds nearby venues through a pluggable place directory, resolves
//! their websites, hunts down their menus, and matches the dish with
//! a price.
//!
//! # Design Philosophy
//!
//! **Cheap strategies first, expensive ones only when needed**
//!
//! - Static HTTP before headless rendering, text layers before OCR
//! - Expected failures are values, not errors; a site that has no
//!   menu is data, not an exception
//! - Every external system sits behind a trait seam with a mock
//! - Per-domain pacing and caching make re-runs polite and cheap
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use menu_search::{
//!     DishMatcher, DishSearchRequest, DomainLimiter, MenuCache, MenuLocator,
//!     MenuPipeline, SearchConfig, SearchOrchestrator, StaticFetcher,
//! };
//!
//! let cache = MenuCache::in_memory();
//! let limiter = Arc::new(DomainLimiter::new(std::time::Duration::from_secs(1)));
//! let fetcher = Arc::new(StaticFetcher::new(Default::default(), cache.clone(), limiter)?);
//! // ... build the locator from fetchers, the pipeline, and run:
//! let report = orchestrator
//!     .search(&DishSearchRequest::new("куриный суп", 55.75, 37.62))
//!     .await?;
//! for hit in &report.found {
//!     println!("{}: {:?}", hit.place.name, hit.menu_item);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (directory, browser, OCR, PDF)
//! - [`types`] - Domain data types
//! - [`text`] - Pure text functions: normalization, matching, prices
//! - [`fetch`] - Acquisition strategies with caching and pacing
//! - [`locate`] - The menu-finding fallback chain
//! - [`search`] - Progressive-radius orchestration
//! - [`queue`] - Optional priority task queue over the pipeline
//! - [`testing`] - Mock implementations for testing

pub mod cache;
pub mod config;
pub mod dish;
pub mod error;
pub mod fetch;
pub mod locate;
pub mod queue;
pub mod search;
pub mod sites;
pub mod testing;
pub mod text;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{CacheError, FetchError, MenuSearchError, QueueError, Result};
pub use traits::{
    BrowserEngine, BrowserProvider, NoBrowser, OcrEngine, PageImage, PdfTextEngine,
    PlaceDirectory, RenderedPage, SharedBrowser, SiteFinder, WebSearcher,
};
pub use types::{
    DishMatch, DishSearchRequest, DishSearchResult, DishStatus, FetchOutcome, MenuContent,
    MenuItem, MenuSource, Place, PriceMatch, SearchReport,
};

pub use config::{FetchConfig, LocateConfig, MatcherConfig, SearchConfig};

// Re-export the pipeline components
pub use cache::{CacheBackend, CacheKind, MemoryCache, MenuCache};
pub use dish::DishMatcher;
pub use fetch::{
    BrowserFetcher, DomainLimiter, ImageOcrFetcher, ImageScanOutcome, PdfFetcher, StaticFetcher,
};
pub use locate::{LocateOutcome, LocatedMenu, MenuLocator};
pub use queue::{
    PipelineRunner, QueueStats, TaskId, TaskKind, TaskOutput, TaskPriority, TaskQueue, TaskResult,
    TaskRunner, TaskStatus,
};
pub use search::{
    CheckVerdict, DishChecker, MenuPipeline, ProgressFn, SearchEvent, SearchOrchestrator,
};
pub use sites::HeuristicSiteFinder;

#[cfg(feature = "sqlite")]
pub use cache::SqliteCache;

// Re-export testing utilities
pub use testing::{
    MockBrowserEngine, MockBrowserProvider, MockDirectory, MockOcrEngine, MockPdfEngine,
    MockSiteFinder, MockWebSearcher,
};
