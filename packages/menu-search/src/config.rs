//! Configuration for the menu-search pipeline.
//!
//! Every fuzzy threshold, keyword list, and scoring constant in the
//! pipeline lives here rather than inline in the logic. The shapes of
//! the heuristics (keyword-count menu test, word-window dish-name
//! reconstruction, prefer-after-anchor price scoring) are fixed; the
//! constants are policy and can be tuned or localized per deployment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for dish/price matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Window before the match anchor considered for prices (chars).
    pub price_window_before: usize,

    /// Window after the match anchor considered for prices (chars).
    ///
    /// Larger than the before-window: prices conventionally follow
    /// dish names on a menu line.
    pub price_window_after: usize,

    /// Distance penalty added to price candidates that occur before
    /// the anchor, in char-equivalents.
    pub before_anchor_penalty: usize,

    /// Plausible price range, inclusive, in assumed currency units.
    pub min_price: f64,

    /// Upper bound of the plausible price range.
    pub max_price: f64,

    /// Words shorter than this are ignored in proximity matching.
    pub min_word_len: usize,

    /// Minimum length of the longest-word fallback match.
    pub min_main_word_len: usize,

    /// Proximity window around a first-word occurrence: chars before.
    pub proximity_before: usize,

    /// Proximity window around a first-word occurrence: chars after.
    pub proximity_after: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            price_window_before: 30,
            price_window_after: 150,
            before_anchor_penalty: 100,
            min_price: 50.0,
            max_price: 50_000.0,
            min_word_len: 3,
            min_main_word_len: 4,
            proximity_before: 20,
            proximity_after: 100,
        }
    }
}

/// Configuration for the menu locator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocateConfig {
    /// Overall budget for one locate operation.
    pub timeout: Duration,

    /// Minimum extracted text length to treat content as usable.
    pub min_content_len: usize,

    /// Keywords that mark a link as menu-related.
    pub menu_keywords: Vec<String>,

    /// Link text/URL fragments that disqualify a link (cart, booking,
    /// contacts and similar navigation).
    pub ignore_keywords: Vec<String>,

    /// Text indicators counted by the menu heuristic.
    pub menu_indicators: Vec<String>,

    /// URL path segments that mark a page as a menu outright.
    pub menu_path_segments: Vec<String>,

    /// Minimum indicator hits for text to look like a menu.
    pub min_indicator_hits: usize,

    /// Score for a menu keyword in link text.
    pub text_keyword_score: i32,

    /// Score for a menu keyword in the link URL.
    pub url_keyword_score: i32,

    /// Bonus for `/menu`-style path segments in the link URL.
    pub path_bonus: i32,

    /// Common menu paths probed relative to the site root.
    pub common_paths: Vec<String>,

    /// How many candidate PDF links to try per page.
    pub max_pdf_candidates: usize,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            min_content_len: 300,
            menu_keywords: str_vec(&[
                "menu", "меню", "carta", "dishes", "блюда", "food", "кухня", "еда",
                "kitchen", "ассортимент",
            ]),
            ignore_keywords: str_vec(&[
                "корзина", "cart", "заказ", "order", "доставка", "delivery", "контакт",
                "contact", "о нас", "about", "бронир", "book", "акции", "promo",
                "новости", "news", "вакансии", "career", "отзыв", "review", "вход",
                "login", "регистр", "register",
            ]),
            menu_indicators: str_vec(&[
                "меню", "блюд", "цена", "порция", "грамм", "салат", "суп", "горячее",
                "десерт", "напитки", "закуск", "₽", "руб", "menu", "dishes", "price",
            ]),
            menu_path_segments: str_vec(&["/menu", "/food", "/dishes", "/кухня", "/меню"]),
            min_indicator_hits: 3,
            text_keyword_score: 10,
            url_keyword_score: 5,
            path_bonus: 15,
            common_paths: str_vec(&[
                "/menu", "/меню", "/food", "/dishes", "/kitchen", "/кухня", "/catalog",
                "/ассортимент", "/carta",
            ]),
            max_pdf_candidates: 3,
        }
    }
}

/// Configuration for content fetchers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout for static HTTP fetches.
    pub request_timeout: Duration,

    /// Minimum interval between requests to one domain.
    pub per_domain_interval: Duration,

    /// Maximum attempts for 429 exponential backoff.
    pub max_retries: u32,

    /// Fixed delay before the single 5xx retry.
    pub server_error_delay: Duration,

    /// Minimum PDF text-layer length before falling back to OCR.
    pub pdf_min_text_len: usize,

    /// Pages rendered to images for PDF OCR.
    pub pdf_ocr_max_pages: usize,

    /// Language string handed to the OCR engine, e.g. "rus+eng".
    pub ocr_languages: String,

    /// Worker threads the caller should budget for CPU-bound OCR.
    pub ocr_workers: usize,

    /// Minimum dimension (px) for an image to be OCR-worthy at all.
    pub image_min_dimension: u32,

    /// Images larger than this (w, h) are OCR candidates even without
    /// menu-keyword tagging.
    pub large_image_size: (u32, u32),

    /// Maximum images OCR'd per page.
    pub max_images_per_page: usize,

    /// Browser settle delay after DOM-ready.
    pub render_settle: Duration,

    /// TTL for cached HTML and extracted page text.
    pub html_ttl: Duration,

    /// TTL for cached PDF and OCR text (lower volatility).
    pub pdf_ttl: Duration,

    /// User agent for static fetches.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            per_domain_interval: Duration::from_secs(1),
            max_retries: 3,
            server_error_delay: Duration::from_secs(1),
            pdf_min_text_len: 100,
            pdf_ocr_max_pages: 5,
            ocr_languages: "rus+eng".to_string(),
            ocr_workers: 2,
            image_min_dimension: 200,
            large_image_size: (400, 300),
            max_images_per_page: 5,
            render_settle: Duration::from_millis(1500),
            html_ttl: Duration::from_secs(3600),
            pdf_ttl: Duration::from_secs(86_400),
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
                "AppleWebKit/537.36 (KHTML, like Gecko) ",
                "Chrome/120.0.0.0 Safari/537.36",
            )
            .to_string(),
        }
    }
}

/// Configuration for the search orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Stop after this many found results.
    pub target_count: usize,

    /// Radius ceiling in meters.
    pub max_radius_m: u32,

    /// Radius increment per step in meters.
    pub radius_step_m: u32,

    /// Concurrent dish-matcher invocations.
    pub max_concurrent: usize,

    /// Places fetched per directory query.
    pub directory_limit: usize,

    /// Domains that are never restaurant websites (social networks,
    /// messengers, review aggregators). Places resolving to these are
    /// skipped without counting as checked.
    pub excluded_domains: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target_count: 3,
            max_radius_m: 1000,
            radius_step_m: 200,
            max_concurrent: 3,
            directory_limit: 20,
            excluded_domains: str_vec(&[
                "vk.com",
                "facebook.com",
                "instagram.com",
                "twitter.com",
                "t.me",
                "telegram.me",
                "wa.me",
                "youtube.com",
                "wikipedia.org",
                "tripadvisor.ru",
                "afisha.ru",
                "restoclub.ru",
                "zoon.ru",
                "delivery-club.ru",
                "eda.yandex.ru",
            ]),
        }
    }
}

impl SearchConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the found-result target.
    pub fn with_target_count(mut self, count: usize) -> Self {
        self.target_count = count;
        self
    }

    /// Set the radius ceiling in meters.
    pub fn with_max_radius(mut self, meters: u32) -> Self {
        self.max_radius_m = meters;
        self
    }

    /// Set the radius step in meters.
    pub fn with_radius_step(mut self, meters: u32) -> Self {
        self.radius_step_m = meters;
        self
    }

    /// Set the concurrency bound for dish matching.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }
}

fn str_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
