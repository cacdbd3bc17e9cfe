//! PDF menu acquisition: text layer first, OCR fallback.
//!
//! Many menus are uploaded as print-ready PDFs with no text layer at
//! all, or with a vector-art layer that extracts to `|` and `_`
//! table-border garbage. When the direct extraction is too short or
//! too noisy, the first pages are rasterized and OCR'd instead.

use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use super::static_html::StaticFetcher;
use crate::cache::{CacheKind, MenuCache};
use crate::config::FetchConfig;
use crate::error::FetchResult;
use crate::traits::PdfTextEngine;
use crate::types::menu::{FetchOutcome, MenuContent, MenuSource};

/// Fetcher for PDF menus.
pub struct PdfFetcher {
    downloader: Arc<StaticFetcher>,
    engine: Arc<dyn PdfTextEngine>,
    cache: MenuCache,
    config: FetchConfig,
}

impl PdfFetcher {
    pub fn new(
        downloader: Arc<StaticFetcher>,
        engine: Arc<dyn PdfTextEngine>,
        cache: MenuCache,
        config: FetchConfig,
    ) -> Self {
        Self {
            downloader,
            engine,
            cache,
            config,
        }
    }

    /// Download a PDF and extract its text, consulting the cache
    /// first. Falls back to OCR when the text layer is unusable.
    pub async fn fetch_pdf(&self, url: &str) -> FetchOutcome {
        if let Some(cached) = self.cache.get(CacheKind::Pdf, url).await {
            match serde_json::from_str::<MenuContent>(&cached) {
                Ok(content) => return FetchOutcome::Success(content),
                Err(_) => self.cache.invalidate(CacheKind::Pdf, url).await,
            }
        }
        match self.fetch_uncached(url).await {
            Ok(content) => {
                if let Ok(json) = serde_json::to_string(&content) {
                    self.cache.set(CacheKind::Pdf, url, &json).await;
                }
                FetchOutcome::Success(content)
            }
            Err(e) => {
                debug!(url = %url, error = %e, "pdf fetch failed");
                FetchOutcome::failure(e.to_string())
            }
        }
    }

    async fn fetch_uncached(&self, url: &str) -> FetchResult<MenuContent> {
        let (data, final_url, content_type) = self.downloader.fetch_bytes(url).await?;
        if !looks_like_pdf(&data, &content_type, url) {
            return Err(crate::error::FetchError::ContentType {
                url: url.to_string(),
                content_type,
            });
        }

        let text = self.engine.extract_text(&data).await?;
        if text.trim().chars().count() >= self.config.pdf_min_text_len {
            // A noisy layer (table-border runs of `|` and `_`) still
            // carries the content; the source tag records that it
            // reads like OCR output.
            let source = if looks_garbled(&text) {
                MenuSource::PdfOcr
            } else {
                MenuSource::PdfText
            };
            debug!(url = %url, len = text.chars().count(), source = source.as_str(), "pdf text layer extracted");
            return Ok(MenuContent::new(text, url, source).with_final_url(final_url));
        }

        info!(url = %url, "pdf text layer too thin, running ocr");
        let ocr_text = self
            .engine
            .ocr_pages(&data, self.config.pdf_ocr_max_pages, &self.config.ocr_languages)
            .await?;
        if ocr_text.trim().chars().count() < self.config.pdf_min_text_len {
            return Err(crate::error::FetchError::Engine(format!(
                "no usable text in pdf: {url}"
            )));
        }
        Ok(MenuContent::new(ocr_text, url, MenuSource::PdfOcr).with_final_url(final_url))
    }
}

/// True when a URL's path names a PDF document (query/fragment
/// ignored).
pub fn is_pdf_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(u) => u.path().to_lowercase().ends_with(".pdf"),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .is_some_and(|p| p.to_lowercase().ends_with(".pdf")),
    }
}

fn looks_like_pdf(data: &[u8], content_type: &str, url: &str) -> bool {
    data.starts_with(b"%PDF") || content_type.contains("pdf") || is_pdf_url(url)
}

/// Table-border garbage: a large share of the non-whitespace
/// characters are `|` or `_`.
fn looks_garbled(text: &str) -> bool {
    let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if visible.is_empty() {
        return true;
    }
    let garbage = visible.iter().filter(|c| matches!(c, '|' | '_')).count();
    (garbage as f64) / (visible.len() as f64) >= 0.3
}
