//! Menu content types: what a fetcher returns and what matching found.

use serde::{Deserialize, Serialize};

/// Which acquisition strategy produced a piece of menu text.
///
/// Carried as a provenance tag on cached/extracted content; callers
/// use it to judge reliability (OCR-derived text is noisier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuSource {
    /// Plain HTTP fetch of server-rendered HTML.
    StaticHtml,
    /// PDF text layer.
    PdfText,
    /// PDF pages rendered to images and OCR'd.
    PdfOcr,
    /// Headless-browser rendered page.
    BrowserRender,
    /// OCR over `<img>` elements of a rendered page.
    ImageOcr,
}

impl MenuSource {
    /// Stable string form used in cache keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuSource::StaticHtml => "static_html",
            MenuSource::PdfText => "pdf_text",
            MenuSource::PdfOcr => "pdf_ocr",
            MenuSource::BrowserRender => "browser_render",
            MenuSource::ImageOcr => "image_ocr",
        }
    }
}

/// Text/HTML obtained for one URL, tagged with its source.
///
/// Ephemeral per fetch; persisted only through the cache as opaque
/// text blobs. `final_url` is the post-redirect URL and may differ
/// from `requested_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuContent {
    /// Extracted visible text.
    pub text: String,

    /// Raw HTML when the strategy produces it (static/browser).
    pub html: Option<String>,

    /// URL the fetch was issued for.
    pub requested_url: String,

    /// URL the content actually came from, after redirects.
    pub final_url: String,

    /// Acquisition strategy that produced this content.
    pub source: MenuSource,
}

impl MenuContent {
    /// Create content where no redirect occurred.
    pub fn new(text: impl Into<String>, url: impl Into<String>, source: MenuSource) -> Self {
        let url = url.into();
        Self {
            text: text.into(),
            html: None,
            requested_url: url.clone(),
            final_url: url,
            source,
        }
    }

    /// Attach raw HTML.
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Record the post-redirect URL.
    pub fn with_final_url(mut self, url: impl Into<String>) -> Self {
        self.final_url = url.into();
        self
    }
}

/// Outcome of one acquisition strategy.
///
/// Fetchers never raise expected failures across their boundary;
/// the locator's fallback chain branches on this tag.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Content acquired.
    Success(MenuContent),
    /// Strategy failed or content was unusable; the reason is
    /// human-readable and ends up in skip/error messages.
    Failure { reason: String },
}

impl FetchOutcome {
    /// Build a failure outcome.
    pub fn failure(reason: impl Into<String>) -> Self {
        FetchOutcome::Failure {
            reason: reason.into(),
        }
    }

    /// True when content was acquired.
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    /// The content, if acquired.
    pub fn content(self) -> Option<MenuContent> {
        match self {
            FetchOutcome::Success(c) => Some(c),
            FetchOutcome::Failure { .. } => None,
        }
    }
}

/// A price candidate extracted near a dish match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMatch {
    /// Numeric value, currency-agnostic.
    pub value: f64,

    /// Exact substring that yielded the value.
    pub raw: String,
}

/// Outcome of searching one piece of menu content for one dish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishMatch {
    /// Whether the dish was located at all.
    pub found: bool,

    /// Char offset into the normalized content; anchors price
    /// extraction only, not stored long-term.
    pub offset: Option<usize>,

    /// Extracted price, when one was discoverable in range.
    pub price: Option<PriceMatch>,
}

impl DishMatch {
    /// A negative match.
    pub fn not_found() -> Self {
        Self {
            found: false,
            offset: None,
            price: None,
        }
    }

    /// A positive match at `offset`.
    pub fn found_at(offset: usize) -> Self {
        Self {
            found: true,
            offset: Some(offset),
            price: None,
        }
    }

    /// Attach an extracted price.
    pub fn with_price(mut self, price: PriceMatch) -> Self {
        self.price = Some(price);
        self
    }
}
