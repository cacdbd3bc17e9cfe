//! OCR over page images, for menus published as pictures.
//!
//! Some restaurants publish their menu only as photographed or
//! designed images. This fetcher captures a rendered page's `<img>`
//! elements, keeps the ones that plausibly hold a menu (tagged with a
//! menu word, or simply large), and OCRs them. Even when OCR yields
//! nothing readable, the presence of such images is reported so the
//! caller can surface a "browse this menu yourself" link.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{CacheKind, MenuCache};
use crate::config::FetchConfig;
use crate::traits::{OcrEngine, PageImage, SharedBrowser};
use crate::types::menu::{MenuContent, MenuSource};

/// Words in an image's alt/src that mark it as a probable menu shot.
const IMAGE_MENU_HINTS: &[&str] = &["menu", "меню", "carta", "karte", "price", "цен"];

static IMG_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<img\b").unwrap());
static PRICE_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"₽|руб|\b\d{3,4}\b").unwrap());

/// Heuristic for a page whose menu exists only as pictures: barely
/// any text next to several images, or menu words with no price
/// markers anywhere.
pub fn is_image_based_menu(html: &str, text: &str) -> bool {
    let image_count = IMG_TAG_RE.find_iter(html).count();
    if text.chars().count() < 200 && image_count >= 3 {
        return true;
    }
    let lower = text.to_lowercase();
    let menu_word = IMAGE_MENU_HINTS
        .iter()
        .any(|hint| lower.contains(hint));
    menu_word && !PRICE_MARKER_RE.is_match(&lower)
}

/// Outcome of scanning a page for image-based menus.
#[derive(Debug, Clone)]
pub enum ImageScanOutcome {
    /// OCR produced usable menu text.
    Content(MenuContent),
    /// Menu-like images exist but OCR read nothing useful from them.
    Suspect { images: usize },
    /// No menu-like images on the page.
    Nothing,
    /// The scan itself failed (browser or OCR unavailable).
    Failed { reason: String },
}

/// Fetcher that OCRs images on a rendered page.
pub struct ImageOcrFetcher {
    browser: Arc<SharedBrowser>,
    ocr: Arc<dyn OcrEngine>,
    cache: MenuCache,
    config: FetchConfig,
}

impl ImageOcrFetcher {
    pub fn new(
        browser: Arc<SharedBrowser>,
        ocr: Arc<dyn OcrEngine>,
        cache: MenuCache,
        config: FetchConfig,
    ) -> Self {
        Self {
            browser,
            ocr,
            cache,
            config,
        }
    }

    /// Capture and OCR menu-like images on `url`.
    pub async fn scan(&self, url: &str) -> ImageScanOutcome {
        if let Some(cached) = self.cache.get(CacheKind::ImageOcr, url).await {
            if let Ok(content) = serde_json::from_str::<MenuContent>(&cached) {
                return ImageScanOutcome::Content(content);
            }
            self.cache.invalidate(CacheKind::ImageOcr, url).await;
        }

        let engine = match self.browser.engine().await {
            Ok(engine) => engine,
            Err(e) => {
                return ImageScanOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        let images = match engine
            .capture_images(url, self.config.image_min_dimension)
            .await
        {
            Ok(images) => images,
            Err(e) => {
                debug!(url = %url, error = %e, "image capture failed");
                return ImageScanOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let candidates: Vec<&PageImage> = images
            .iter()
            .filter(|img| self.is_menu_candidate(img))
            .take(self.config.max_images_per_page)
            .collect();
        if candidates.is_empty() {
            return ImageScanOutcome::Nothing;
        }
        info!(url = %url, candidates = candidates.len(), "running ocr over page images");

        let mut pieces = Vec::new();
        for image in &candidates {
            match self
                .ocr
                .recognize(&image.data, &self.config.ocr_languages)
                .await
            {
                Ok(text) if !text.trim().is_empty() => pieces.push(text.trim().to_string()),
                Ok(_) => {}
                Err(e) => {
                    debug!(url = %url, src = %image.src, error = %e, "ocr failed for image")
                }
            }
        }

        let combined = pieces.join("\n\n");
        if combined.chars().count() < self.config.pdf_min_text_len {
            return ImageScanOutcome::Suspect {
                images: candidates.len(),
            };
        }
        let content = MenuContent::new(combined, url, MenuSource::ImageOcr);
        if let Ok(json) = serde_json::to_string(&content) {
            self.cache.set(CacheKind::ImageOcr, url, &json).await;
        }
        ImageScanOutcome::Content(content)
    }

    /// Menu-tagged images qualify at any size past the capture floor;
    /// untagged ones only when large enough to be a full menu shot.
    fn is_menu_candidate(&self, image: &PageImage) -> bool {
        let tagged = IMAGE_MENU_HINTS.iter().any(|hint| {
            image.alt.to_lowercase().contains(hint) || image.src.to_lowercase().contains(hint)
        });
        if tagged {
            return true;
        }
        let (w, h) = self.config.large_image_size;
        image.width >= w && image.height >= h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> ImageOcrFetcher {
        use crate::traits::NoBrowser;
        ImageOcrFetcher::new(
            Arc::new(SharedBrowser::new(Arc::new(NoBrowser))),
            Arc::new(NeverOcr),
            MenuCache::in_memory(),
            FetchConfig::default(),
        )
    }

    struct NeverOcr;

    #[async_trait::async_trait]
    impl OcrEngine for NeverOcr {
        async fn recognize(
            &self,
            _image: &[u8],
            _languages: &str,
        ) -> crate::error::FetchResult<String> {
            Ok(String::new())
        }
    }

    fn image(width: u32, height: u32, alt: &str, src: &str) -> PageImage {
        PageImage {
            data: vec![0u8; 4],
            width,
            height,
            alt: alt.to_string(),
            src: src.to_string(),
        }
    }

    #[test]
    fn menu_tagged_images_qualify_at_any_size() {
        let f = fetcher();
        assert!(f.is_menu_candidate(&image(250, 250, "наше меню", "/img/1.jpg")));
        assert!(f.is_menu_candidate(&image(250, 250, "", "/uploads/menu-page-2.png")));
    }

    #[test]
    fn untagged_images_must_be_large() {
        let f = fetcher();
        assert!(f.is_menu_candidate(&image(800, 600, "", "/img/photo.jpg")));
        assert!(!f.is_menu_candidate(&image(350, 250, "", "/img/photo.jpg")));
    }

    #[test]
    fn image_based_pages_are_detected() {
        let gallery = r#"<div><img src="a.jpg"><img src="b.jpg"><img src="c.jpg"></div>"#;
        assert!(is_image_based_menu(gallery, "Фото"));

        // Menu word, no prices anywhere.
        assert!(is_image_based_menu("<p>тут</p>", "Наше меню смотрите на фотографиях"));

        // Real textual menu with prices.
        assert!(!is_image_based_menu(
            "<p></p>",
            "Меню: Борщ 350 руб, Салат Цезарь 450 руб"
        ));
    }

    #[tokio::test]
    async fn no_browser_reports_failed() {
        let f = fetcher();
        match f.scan("https://cafe.example/").await {
            ImageScanOutcome::Failed { .. } => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
