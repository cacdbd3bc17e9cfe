//! Capability engines: headless browser, OCR, PDF text extraction.
//!
//! These wrap external processes or native libraries whose internals
//! are outside this crate; the pipeline only depends on the traits.
//! The browser handle is expensive (an OS process), so it is shared
//! across calls through [`SharedBrowser`]: lazily initialized under a
//! lock, explicitly shut down by the owner.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{FetchError, FetchResult};

/// A fully rendered page as the browser saw it.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Rendered DOM serialized to HTML.
    pub html: String,

    /// Visible text with scripts/styles removed.
    pub text: String,

    /// URL after redirects.
    pub final_url: String,
}

/// An image captured from a rendered page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Encoded image bytes (engine's choice of format).
    pub data: Vec<u8>,

    /// Rendered width in px.
    pub width: u32,

    /// Rendered height in px.
    pub height: u32,

    /// The element's alt text, lowercased, possibly empty.
    pub alt: String,

    /// The element's src attribute, possibly empty.
    pub src: String,
}

/// A headless browser session.
///
/// One engine instance maps to one browser/context pair; `render`
/// calls may run concurrently (each opens its own page) but the
/// engine itself is created once. Implementations are expected to
/// block image/font/tracking subresources, wait for DOM-ready plus a
/// settle delay, and report the post-redirect URL.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Navigate to `url` and return the rendered page.
    async fn render(&self, url: &str, settle: Duration) -> FetchResult<RenderedPage>;

    /// Capture `<img>` elements of at least `min_dimension` px on
    /// both axes, with their metadata.
    async fn capture_images(&self, url: &str, min_dimension: u32) -> FetchResult<Vec<PageImage>>;

    /// Release the browser process and its OS resources.
    async fn close(&self) -> FetchResult<()>;
}

/// Launches browser engines. Split from [`BrowserEngine`] so the
/// expensive launch can be deferred until a render is actually
/// needed.
#[async_trait]
pub trait BrowserProvider: Send + Sync {
    /// Start a browser and hand back its engine.
    async fn launch(&self) -> FetchResult<Arc<dyn BrowserEngine>>;
}

/// Lazily-initialized shared browser handle.
///
/// Concurrent first-callers are serialized by the init lock so only
/// one browser is ever launched; page-level state is per-render and
/// not shared. The owner calls [`shutdown`](Self::shutdown) to
/// release the process deterministically.
pub struct SharedBrowser {
    provider: Arc<dyn BrowserProvider>,
    slot: Mutex<Option<Arc<dyn BrowserEngine>>>,
}

impl SharedBrowser {
    /// Create a handle that will launch through `provider` on first
    /// use.
    pub fn new(provider: Arc<dyn BrowserProvider>) -> Self {
        Self {
            provider,
            slot: Mutex::new(None),
        }
    }

    /// The shared engine, launching it if this is the first call.
    pub async fn engine(&self) -> FetchResult<Arc<dyn BrowserEngine>> {
        let mut slot = self.slot.lock().await;
        if let Some(engine) = slot.as_ref() {
            return Ok(engine.clone());
        }
        info!("launching shared browser engine");
        let engine = self.provider.launch().await?;
        *slot = Some(engine.clone());
        Ok(engine)
    }

    /// True when a browser has been launched and not shut down.
    pub async fn is_running(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Close the browser, if one was ever launched.
    pub async fn shutdown(&self) -> FetchResult<()> {
        let engine = self.slot.lock().await.take();
        match engine {
            Some(engine) => engine.close().await,
            None => Ok(()),
        }
    }
}

/// PDF text extraction: direct text layer plus OCR fallback over
/// rasterized pages.
#[async_trait]
pub trait PdfTextEngine: Send + Sync {
    /// Extract the text layer. An empty string is a valid result for
    /// scanned documents.
    async fn extract_text(&self, data: &[u8]) -> FetchResult<String>;

    /// Rasterize up to `max_pages` pages and OCR them.
    async fn ocr_pages(&self, data: &[u8], max_pages: usize, languages: &str)
        -> FetchResult<String>;
}

/// OCR over a single image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in `image`.
    async fn recognize(&self, image: &[u8], languages: &str) -> FetchResult<String>;
}

/// Provider used when no browser is configured: every launch fails,
/// which the locator treats as "browser fallback unavailable".
pub struct NoBrowser;

#[async_trait]
impl BrowserProvider for NoBrowser {
    async fn launch(&self) -> FetchResult<Arc<dyn BrowserEngine>> {
        Err(FetchError::Engine("no browser engine configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        launches: AtomicUsize,
    }

    struct NullEngine;

    #[async_trait]
    impl BrowserEngine for NullEngine {
        async fn render(&self, url: &str, _settle: Duration) -> FetchResult<RenderedPage> {
            Ok(RenderedPage {
                html: String::new(),
                text: String::new(),
                final_url: url.to_string(),
            })
        }

        async fn capture_images(
            &self,
            _url: &str,
            _min_dimension: u32,
        ) -> FetchResult<Vec<PageImage>> {
            Ok(vec![])
        }

        async fn close(&self) -> FetchResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl BrowserProvider for CountingProvider {
        async fn launch(&self) -> FetchResult<Arc<dyn BrowserEngine>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullEngine))
        }
    }

    #[tokio::test]
    async fn launches_exactly_once_across_concurrent_callers() {
        let provider = Arc::new(CountingProvider {
            launches: AtomicUsize::new(0),
        });
        let shared = Arc::new(SharedBrowser::new(provider.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move { shared.engine().await.is_ok() }));
        }
        for h in handles {
            assert!(h.await.unwrap());
        }
        assert_eq!(provider.launches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_clears_the_slot() {
        let provider = Arc::new(CountingProvider {
            launches: AtomicUsize::new(0),
        });
        let shared = SharedBrowser::new(provider.clone());

        shared.engine().await.unwrap();
        assert!(shared.is_running().await);

        shared.shutdown().await.unwrap();
        assert!(!shared.is_running().await);

        // Next use relaunches.
        shared.engine().await.unwrap();
        assert_eq!(provider.launches.load(Ordering::SeqCst), 2);
    }
}
