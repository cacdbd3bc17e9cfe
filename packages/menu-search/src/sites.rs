//! Website resolution for places the directory returned without one.
//!
//! Directories frequently list a place's VK page or an aggregator
//! profile as its "website". Those are rejected outright; for the
//! rest, a transliterated brand name is tried as a domain guess
//! (many small restaurants live at `{brand}.ru`), and an optional
//! [`WebSearcher`] runs as the last resort. Every candidate is
//! verified with a real fetch before being returned.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::fetch::StaticFetcher;
use crate::text::{normalize_for_search, transliterate};
use crate::traits::{SiteFinder, WebSearcher};
use crate::types::Place;

/// True when `url`'s host is (or is under) one of `excluded`.
pub fn is_excluded_domain(url: &str, excluded: &[String]) -> bool {
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    else {
        return false;
    };
    excluded
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// Resolver that trusts the directory's URL when it is a real
/// website, and otherwise guesses domains from the place name.
pub struct HeuristicSiteFinder {
    fetcher: Arc<StaticFetcher>,
    excluded_domains: Vec<String>,
    searcher: Option<Arc<dyn WebSearcher>>,
}

impl HeuristicSiteFinder {
    pub fn new(fetcher: Arc<StaticFetcher>, excluded_domains: Vec<String>) -> Self {
        Self {
            fetcher,
            excluded_domains,
            searcher: None,
        }
    }

    /// Enable the web-search fallback, consulted only after the
    /// directory URL and domain guesses come up empty.
    pub fn with_searcher(mut self, searcher: Arc<dyn WebSearcher>) -> Self {
        self.searcher = Some(searcher);
        self
    }

    /// Candidate domains from the place name: transliterated, spaces
    /// removed. Too-short slugs guess nothing (the false-positive
    /// rate on 3-letter domains is total).
    fn domain_guesses(&self, name: &str) -> Vec<String> {
        let slug: String = transliterate(&normalize_for_search(name))
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if slug.chars().count() < 4 {
            return Vec::new();
        }
        vec![
            format!("https://{slug}.ru"),
            format!("https://www.{slug}.ru"),
            format!("https://{slug}.com"),
        ]
    }
}

#[async_trait]
impl SiteFinder for HeuristicSiteFinder {
    async fn find_website(&self, place: &Place) -> Option<String> {
        if let Some(site) = &place.website {
            if !is_excluded_domain(site, &self.excluded_domains) {
                return Some(site.clone());
            }
            debug!(place = %place.name, url = %site, "directory url is not a real website");
        }

        for candidate in self.domain_guesses(&place.name) {
            if self.fetcher.fetch_page(&candidate).await.is_success() {
                debug!(place = %place.name, url = %candidate, "domain guess verified");
                return Some(candidate);
            }
        }

        if let Some(searcher) = &self.searcher {
            let query = format!("{} {} официальный сайт", place.name, place.address);
            let hits = match searcher.search(&query, 3).await {
                Ok(hits) => hits,
                Err(e) => {
                    debug!(place = %place.name, error = %e, "web search failed");
                    return None;
                }
            };
            for hit in hits {
                if is_excluded_domain(&hit, &self.excluded_domains) {
                    continue;
                }
                if self.fetcher.fetch_page(&hit).await.is_success() {
                    debug!(place = %place.name, url = %hit, "search result verified");
                    return Some(hit);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;

    #[test]
    fn excluded_domains_match_subdomains() {
        let excluded = SearchConfig::default().excluded_domains;
        assert!(is_excluded_domain("https://vk.com/cafe_picco", &excluded));
        assert!(is_excluded_domain("https://m.vk.com/cafe_picco", &excluded));
        assert!(!is_excluded_domain("https://picco.ru/", &excluded));
        // No suffix tricks.
        assert!(!is_excluded_domain("https://notvk.com/", &excluded));
    }

    #[test]
    fn guesses_come_from_transliterated_name() {
        let finder = HeuristicSiteFinder::new(
            Arc::new(test_fetcher()),
            SearchConfig::default().excluded_domains,
        );
        let guesses = finder.domain_guesses("Кафе Пушкинъ");
        assert_eq!(guesses[0], "https://kafepushkin.ru");
    }

    #[tokio::test]
    async fn search_fallback_skips_excluded_hits_and_verifies_the_rest() {
        use crate::testing::MockWebSearcher;
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>Кафе</p></body></html>"),
            )
            .mount(&server)
            .await;

        let good = format!("{}/", server.uri());
        let searcher = Arc::new(
            MockWebSearcher::new()
                .with_hit("https://vk.com/bar_profile")
                .with_hit(good.clone()),
        );
        // Short name, so the domain-guess step stays quiet and only
        // the search fallback runs.
        let finder = HeuristicSiteFinder::new(
            Arc::new(test_fetcher()),
            SearchConfig::default().excluded_domains,
        )
        .with_searcher(searcher.clone());

        let place = Place::new("1", "Бар", "ул. Тестовая 2", 55.7, 37.6);
        assert_eq!(finder.find_website(&place).await.as_deref(), Some(good.as_str()));
        assert_eq!(searcher.queries().len(), 1);
    }

    #[test]
    fn short_names_guess_nothing() {
        let finder = HeuristicSiteFinder::new(
            Arc::new(test_fetcher()),
            SearchConfig::default().excluded_domains,
        );
        assert!(finder.domain_guesses("Бар").is_empty());
    }

    fn test_fetcher() -> StaticFetcher {
        use crate::cache::MenuCache;
        use crate::config::FetchConfig;
        use crate::fetch::DomainLimiter;
        StaticFetcher::new(
            FetchConfig::default(),
            MenuCache::in_memory(),
            Arc::new(DomainLimiter::unlimited()),
        )
        .unwrap()
    }
}
