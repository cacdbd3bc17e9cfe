//! Site finder collaborator: place → official website.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::types::Place;

/// Resolves a place to its official website, best effort.
///
/// Implementations may scrape a directory page, guess domains from a
/// transliterated brand name, or fall back to a rate-limited search
/// engine. The contract is just "URL or none"; known non-website
/// domains (social networks, messengers, review aggregators) must be
/// rejected before returning.
#[async_trait]
pub trait SiteFinder: Send + Sync {
    /// The website URL, or `None` when no credible site exists.
    async fn find_website(&self, place: &Place) -> Option<String>;
}

/// Web-search collaborator, the most expensive site-discovery step.
///
/// Abstracts over search providers; implementations are expected to
/// rate-limit themselves. Results still get verified and filtered
/// against the excluded-domain list by the caller.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Result URLs for `query`, best first, at most `limit`.
    async fn search(&self, query: &str, limit: usize) -> FetchResult<Vec<String>>;
}
