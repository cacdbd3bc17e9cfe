//! Headless-browser fallback for script-rendered sites.
//!
//! The browser is the most expensive strategy in the chain, so it is
//! only reached when static fetching produced nothing usable, and the
//! underlying engine is launched lazily through [`SharedBrowser`].

use std::sync::Arc;
use tracing::debug;

use crate::cache::{CacheKind, MenuCache};
use crate::config::FetchConfig;
use crate::traits::SharedBrowser;
use crate::types::menu::{FetchOutcome, MenuContent, MenuSource};

/// Fetcher that renders pages in a shared headless browser.
pub struct BrowserFetcher {
    browser: Arc<SharedBrowser>,
    cache: MenuCache,
    config: FetchConfig,
}

impl BrowserFetcher {
    pub fn new(browser: Arc<SharedBrowser>, cache: MenuCache, config: FetchConfig) -> Self {
        Self {
            browser,
            cache,
            config,
        }
    }

    /// Render a page and extract its visible text, consulting the
    /// cache first. Rendered content is cached separately from static
    /// content because the two can differ for the same URL.
    pub async fn fetch_rendered(&self, url: &str) -> FetchOutcome {
        if let Some(cached) = self.cache.get(CacheKind::Text, url).await {
            match serde_json::from_str::<MenuContent>(&cached) {
                Ok(content) => return FetchOutcome::Success(content),
                Err(_) => self.cache.invalidate(CacheKind::Text, url).await,
            }
        }

        let engine = match self.browser.engine().await {
            Ok(engine) => engine,
            Err(e) => {
                debug!(url = %url, error = %e, "browser unavailable");
                return FetchOutcome::failure(e.to_string());
            }
        };
        match engine.render(url, self.config.render_settle).await {
            Ok(page) => {
                let content = MenuContent::new(page.text, url, MenuSource::BrowserRender)
                    .with_html(page.html)
                    .with_final_url(page.final_url);
                if let Ok(json) = serde_json::to_string(&content) {
                    self.cache.set(CacheKind::Text, url, &json).await;
                }
                FetchOutcome::Success(content)
            }
            Err(e) => {
                debug!(url = %url, error = %e, "browser render failed");
                FetchOutcome::failure(e.to_string())
            }
        }
    }
}
