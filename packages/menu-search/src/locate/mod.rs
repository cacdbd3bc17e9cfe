//! Menu location: from a restaurant's website URL to menu text.
//!
//! Strategies run as a fallback chain, cheapest first:
//!
//! 1. the site URL itself, when it points straight at a PDF
//! 2. static fetch of the site root (the root often is the menu)
//! 3. PDF links found on the root page
//! 4. links scored by menu keywords in text, URL, and path; same-page
//!    `#menu` anchors fall back to the root's own text
//! 5. common menu paths probed blind (`/menu`, `/меню`, ...)
//! 6. headless-browser render of the root and the best candidate
//! 7. OCR over page images, when the page looks image-based
//!
//! The first page that reads like a menu wins. The whole chain runs
//! under one timeout; a site that drips bytes forever costs one
//! locate budget, not a hung search.

mod score;

pub use score::{
    has_menu_fragment, indicator_hits, looks_like_menu, rank_links, score_link, url_is_menu_path,
};

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::LocateConfig;
use crate::text::normalize;
use crate::fetch::{
    extract_links, is_image_based_menu, is_pdf_url, BrowserFetcher, ImageOcrFetcher,
    ImageScanOutcome, MenuContent, PdfFetcher, StaticFetcher,
};

/// A located menu: the content plus the URL it lives at.
#[derive(Debug, Clone)]
pub struct LocatedMenu {
    /// Menu text (and HTML where available).
    pub content: MenuContent,

    /// Where the menu was found; not always on the site's own domain.
    pub menu_url: String,
}

/// Verdict of one locate run.
#[derive(Debug, Clone)]
pub enum LocateOutcome {
    /// A page reading like a menu was found.
    Found(LocatedMenu),

    /// The site carries menu-like images that OCR could not read;
    /// worth surfacing to a human.
    ImageMenuSuspect { url: String },

    /// No usable menu anywhere on the site.
    NotFound { reason: String },
}

/// Runs the strategy chain for one site.
pub struct MenuLocator {
    static_fetcher: Arc<StaticFetcher>,
    pdf_fetcher: Arc<PdfFetcher>,
    browser_fetcher: Arc<BrowserFetcher>,
    image_fetcher: Arc<ImageOcrFetcher>,
    config: LocateConfig,
}

impl MenuLocator {
    pub fn new(
        static_fetcher: Arc<StaticFetcher>,
        pdf_fetcher: Arc<PdfFetcher>,
        browser_fetcher: Arc<BrowserFetcher>,
        image_fetcher: Arc<ImageOcrFetcher>,
        config: LocateConfig,
    ) -> Self {
        Self {
            static_fetcher,
            pdf_fetcher,
            browser_fetcher,
            image_fetcher,
            config,
        }
    }

    /// Locate the menu for `site_url`, under the configured timeout.
    /// A page that already names `dish_name` is accepted outright,
    /// so a hit on an early cheap strategy skips the expensive ones.
    pub async fn locate(&self, site_url: &str, dish_name: &str) -> LocateOutcome {
        let url = ensure_scheme(site_url);
        match tokio::time::timeout(self.config.timeout, self.locate_inner(&url, dish_name)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(url = %url, "menu locate timed out");
                LocateOutcome::NotFound {
                    reason: format!("locate timed out after {:?}", self.config.timeout),
                }
            }
        }
    }

    async fn locate_inner(&self, url: &str, dish: &str) -> LocateOutcome {
        let mut tried: HashSet<String> = HashSet::new();

        // Direct PDF link: nothing else to try.
        if is_pdf_url(url) {
            return match self.try_pdf(url, &mut tried).await {
                Some(found) => LocateOutcome::Found(found),
                None => LocateOutcome::NotFound {
                    reason: format!("pdf not usable: {url}"),
                },
            };
        }

        tried.insert(url.to_string());
        let root = self.static_fetcher.fetch_page(url).await;
        let root_content = match root {
            crate::fetch::FetchOutcome::Success(content) => {
                if self.page_is_menu(&content.text, &content.final_url, dish) {
                    info!(url = %url, "site root reads like a menu");
                    return LocateOutcome::Found(LocatedMenu {
                        menu_url: content.final_url.clone(),
                        content,
                    });
                }
                Some(content)
            }
            crate::fetch::FetchOutcome::Failure { reason } => {
                debug!(url = %url, reason = %reason, "site root not fetchable statically");
                None
            }
        };

        if let Some(content) = &root_content {
            if let Some(html) = &content.html {
                let links = extract_links(html, &content.final_url);

                // PDF links beat scored HTML links: a linked PDF is
                // almost always the actual menu document.
                let pdf_links: Vec<String> = links
                    .iter()
                    .filter(|l| is_pdf_url(&l.href))
                    .map(|l| l.href.clone())
                    .take(self.config.max_pdf_candidates)
                    .collect();
                for href in pdf_links {
                    if let Some(found) = self.try_pdf(&href, &mut tried).await {
                        return LocateOutcome::Found(found);
                    }
                }

                for link in rank_links(&links, &self.config).into_iter().take(5) {
                    if let Some(found) = self.try_candidate(&link.href, dish, &mut tried).await {
                        return LocateOutcome::Found(found);
                    }
                }

                // Same-page `#menu` anchors rank below real links:
                // they say the menu is a section of the root itself.
                if has_menu_fragment(html, &self.config)
                    && content.text.chars().count() >= self.config.min_content_len
                {
                    debug!(url = %url, "root carries a same-page menu anchor");
                    return LocateOutcome::Found(LocatedMenu {
                        menu_url: content.final_url.clone(),
                        content: content.clone(),
                    });
                }
            }
        }

        // Blind probes relative to the site origin.
        if let Some(origin) = origin_of(url) {
            for path in &self.config.common_paths {
                let candidate = format!("{origin}{path}");
                if let Some(found) = self.try_candidate(&candidate, dish, &mut tried).await {
                    return LocateOutcome::Found(found);
                }
            }
        }

        // Browser fallback: the root again, rendered this time, then
        // the best rendered candidate link.
        let rendered = self.browser_fetcher.fetch_rendered(url).await.content();
        if let Some(page) = &rendered {
            if self.page_is_menu(&page.text, &page.final_url, dish) {
                info!(url = %url, "rendered root reads like a menu");
                return LocateOutcome::Found(LocatedMenu {
                    menu_url: page.final_url.clone(),
                    content: page.clone(),
                });
            }
            if let Some(html) = &page.html {
                let links = extract_links(html, &page.final_url);
                // A candidate already fetched statically is still
                // worth rendering: its real content may only exist
                // after scripts run. PDFs render the same either way
                // and stay deduplicated.
                for link in rank_links(&links, &self.config).into_iter().take(2) {
                    if is_pdf_url(&link.href) {
                        if tried.insert(link.href.clone()) {
                            if let Some(found) = self.check_pdf(&link.href).await {
                                return LocateOutcome::Found(found);
                            }
                        }
                        continue;
                    }
                    let outcome = self.browser_fetcher.fetch_rendered(&link.href).await;
                    if let Some(content) = outcome.content() {
                        // Last page-fetching strategy, so a rendered
                        // candidate with substantial text is accepted
                        // even when the keyword heuristic misses it.
                        if self.page_is_menu(&content.text, &content.final_url, dish)
                            || content.text.chars().count() >= self.config.min_content_len
                        {
                            return LocateOutcome::Found(LocatedMenu {
                                menu_url: content.final_url.clone(),
                                content,
                            });
                        }
                    }
                }
            }
        }

        // Last resort: the menu may only exist as images. A rendered
        // page that plainly is not image-based skips the OCR pass.
        let worth_scanning = match &rendered {
            Some(page) => page
                .html
                .as_deref()
                .map(|html| is_image_based_menu(html, &page.text))
                .unwrap_or(true),
            None => true,
        };
        if !worth_scanning {
            return LocateOutcome::NotFound {
                reason: "no page on this site reads like a menu".to_string(),
            };
        }
        match self.image_fetcher.scan(url).await {
            ImageScanOutcome::Content(content) => {
                info!(url = %url, "menu recovered from page images");
                LocateOutcome::Found(LocatedMenu {
                    menu_url: url.to_string(),
                    content,
                })
            }
            ImageScanOutcome::Suspect { images } => {
                info!(url = %url, images, "menu images present but unreadable");
                LocateOutcome::ImageMenuSuspect {
                    url: url.to_string(),
                }
            }
            ImageScanOutcome::Nothing | ImageScanOutcome::Failed { .. } => {
                LocateOutcome::NotFound {
                    reason: "no page on this site reads like a menu".to_string(),
                }
            }
        }
    }

    /// The configured keyword heuristic, or the requested dish
    /// itself: a page that already names the dish needs no further
    /// evidence of being a menu.
    fn page_is_menu(&self, text: &str, url: &str, dish: &str) -> bool {
        if looks_like_menu(text, url, &self.config) {
            return true;
        }
        let dish = normalize(dish);
        !dish.is_empty() && normalize(text).contains(&dish)
    }

    /// Try one non-root candidate URL, static or PDF by extension.
    async fn try_candidate(
        &self,
        url: &str,
        dish: &str,
        tried: &mut HashSet<String>,
    ) -> Option<LocatedMenu> {
        if !tried.insert(url.to_string()) {
            return None;
        }
        if is_pdf_url(url) {
            return self.check_pdf(url).await;
        }
        let content = self.static_fetcher.fetch_page(url).await.content()?;
        if self.page_is_menu(&content.text, &content.final_url, dish) {
            debug!(url = %url, "candidate page reads like a menu");
            return Some(LocatedMenu {
                menu_url: content.final_url.clone(),
                content,
            });
        }
        // Not a menu itself, but it may be a "download our menu"
        // page pointing straight at a PDF.
        if let Some(html) = &content.html {
            let pdf_links: Vec<String> = extract_links(html, &content.final_url)
                .into_iter()
                .filter(|l| is_pdf_url(&l.href))
                .map(|l| l.href)
                .take(self.config.max_pdf_candidates)
                .collect();
            for href in pdf_links {
                if let Some(found) = self.try_pdf(&href, tried).await {
                    return Some(found);
                }
            }
        }
        None
    }

    async fn try_pdf(&self, url: &str, tried: &mut HashSet<String>) -> Option<LocatedMenu> {
        if !tried.insert(url.to_string()) {
            return None;
        }
        self.check_pdf(url).await
    }

    /// PDFs get a looser test than HTML pages: one indicator is
    /// enough, since the fetcher already enforced a length floor, and
    /// OCR noise eats indicator words.
    async fn check_pdf(&self, url: &str) -> Option<LocatedMenu> {
        let content = self.pdf_fetcher.fetch_pdf(url).await.content()?;
        if indicator_hits(&content.text, &self.config) >= 1 {
            debug!(url = %url, "pdf reads like a menu");
            return Some(LocatedMenu {
                menu_url: url.to_string(),
                content,
            });
        }
        None
    }
}

/// Prefix bare domains with https.
fn ensure_scheme(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// `scheme://host[:port]` with no trailing slash.
fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let origin = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };
    Some(origin)
}
