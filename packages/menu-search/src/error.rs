//! Typed errors for the menu-search library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Expected failures
//! (a site that will not load, a menu that cannot be found) are
//! modeled as result values, not errors; these enums cover the
//! faults that cross module boundaries.

use thiserror::Error;

/// Errors raised by content fetchers.
///
/// A fetcher converts every one of these into a structured
/// [`FetchOutcome::Failure`](crate::fetch::FetchOutcome) at its own
/// boundary; they never propagate past the menu locator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (non-2xx, connection error).
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Access forbidden; never retried.
    #[error("access forbidden: {url}")]
    Forbidden { url: String },

    /// Request timed out; never retried.
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// DNS resolution or connection failure; never retried.
    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },

    /// Retries exhausted (429 backoff or 5xx retry budget spent).
    #[error("retries exhausted for: {url}")]
    RetriesExhausted { url: String },

    /// Invalid URL format.
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Response was not the expected content type (e.g. not a PDF).
    #[error("unexpected content type for {url}: {content_type}")]
    ContentType { url: String, content_type: String },

    /// A capability engine (browser, OCR, PDF text layer) is not
    /// available or failed internally.
    #[error("engine unavailable: {0}")]
    Engine(String),
}

/// Errors raised by the cache boundary.
///
/// Callers treat every cache error as a miss; a backend outage must
/// never block a fetch.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backend storage failed.
    #[error("cache backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by the task queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Queue is not running or shut down.
    #[error("task queue stopped")]
    Stopped,

    /// No task with the given id.
    #[error("unknown task: {id}")]
    UnknownTask { id: String },

    /// Waiting for a result timed out.
    #[error("task timed out: {id}")]
    Timeout { id: String },
}

/// Top-level errors for search operations.
#[derive(Debug, Error)]
pub enum MenuSearchError {
    /// Fetch layer fault that escaped conversion (programmer error).
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Cache layer fault.
    #[error("cache failed: {0}")]
    Cache(#[from] CacheError),

    /// Task queue fault.
    #[error("queue failed: {0}")]
    Queue(#[from] QueueError),

    /// Place directory lookup failed.
    #[error("directory error: {0}")]
    Directory(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Result type alias for queue operations.
pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, MenuSearchError>;
