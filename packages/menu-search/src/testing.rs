//! Testing utilities including mock implementations.
//!
//! Useful for testing applications built on this library without a
//! real geo directory, browser, or OCR stack. All mocks are
//! deterministic, configured with builder methods, and record their
//! calls for assertions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult, Result};
use crate::traits::{
    BrowserEngine, BrowserProvider, OcrEngine, PageImage, PdfTextEngine, PlaceDirectory,
    RenderedPage, SiteFinder, WebSearcher,
};
use crate::types::Place;

/// A mock place directory with scripted geocoding and scripted
/// places per radius.
///
/// `search_nearby` returns every place whose configured radius is at
/// most the queried radius, so progressive-radius expansion behaves
/// like a real directory: wider queries repeat the closer places.
#[derive(Default)]
pub struct MockDirectory {
    geocodes: RwLock<HashMap<String, (f64, f64)>>,
    places: RwLock<Vec<(u32, Place)>>,
    calls: RwLock<Vec<DirectoryCall>>,
}

/// Record of a call made to [`MockDirectory`].
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryCall {
    Geocode { address: String },
    SearchNearby { radius_m: u32 },
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a geocoding answer.
    pub fn with_geocode(self, address: impl Into<String>, lat: f64, lon: f64) -> Self {
        self.geocodes
            .write()
            .unwrap()
            .insert(address.into(), (lat, lon));
        self
    }

    /// Add a place visible from `radius_m` outward.
    pub fn with_place(self, radius_m: u32, place: Place) -> Self {
        self.places.write().unwrap().push((radius_m, place));
        self
    }

    /// Calls made so far.
    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl PlaceDirectory for MockDirectory {
    async fn geocode(&self, address: &str) -> Result<Option<(f64, f64)>> {
        self.calls.write().unwrap().push(DirectoryCall::Geocode {
            address: address.to_string(),
        });
        Ok(self.geocodes.read().unwrap().get(address).copied())
    }

    async fn search_nearby(
        &self,
        _lat: f64,
        _lon: f64,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Place>> {
        self.calls
            .write()
            .unwrap()
            .push(DirectoryCall::SearchNearby { radius_m });
        Ok(self
            .places
            .read()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r <= radius_m)
            .map(|(_, p)| p.clone())
            .take(limit)
            .collect())
    }
}

/// A mock site finder answering from a place-id map.
#[derive(Default)]
pub struct MockSiteFinder {
    sites: RwLock<HashMap<String, String>>,
}

impl MockSiteFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a website for a place id.
    pub fn with_site(self, place_id: impl Into<String>, url: impl Into<String>) -> Self {
        self.sites
            .write()
            .unwrap()
            .insert(place_id.into(), url.into());
        self
    }
}

#[async_trait]
impl SiteFinder for MockSiteFinder {
    async fn find_website(&self, place: &Place) -> Option<String> {
        if let Some(site) = &place.website {
            return Some(site.clone());
        }
        self.sites.read().unwrap().get(&place.id).cloned()
    }
}

/// A mock web searcher returning the same scripted hits for every
/// query, recording the queries it saw.
#[derive(Default)]
pub struct MockWebSearcher {
    hits: RwLock<Vec<String>>,
    queries: RwLock<Vec<String>>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result URL, returned in insertion order.
    pub fn with_hit(self, url: impl Into<String>) -> Self {
        self.hits.write().unwrap().push(url.into());
        self
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &str, limit: usize) -> FetchResult<Vec<String>> {
        self.queries.write().unwrap().push(query.to_string());
        Ok(self
            .hits
            .read()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }
}

/// A mock browser engine serving scripted pages and images by URL.
#[derive(Default)]
pub struct MockBrowserEngine {
    pages: RwLock<HashMap<String, RenderedPage>>,
    images: RwLock<HashMap<String, Vec<PageImage>>>,
    renders: RwLock<Vec<String>>,
}

impl MockBrowserEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a rendered page for a URL.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        let html = html.into();
        let page = RenderedPage {
            text: crate::fetch::html_to_text(&html),
            html,
            final_url: url.clone(),
        };
        self.pages.write().unwrap().insert(url, page);
        self
    }

    /// Script captured images for a URL.
    pub fn with_images(self, url: impl Into<String>, images: Vec<PageImage>) -> Self {
        self.images.write().unwrap().insert(url.into(), images);
        self
    }

    /// URLs rendered so far.
    pub fn rendered(&self) -> Vec<String> {
        self.renders.read().unwrap().clone()
    }
}

#[async_trait]
impl BrowserEngine for MockBrowserEngine {
    async fn render(&self, url: &str, _settle: Duration) -> FetchResult<RenderedPage> {
        self.renders.write().unwrap().push(url.to_string());
        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Network {
                url: url.to_string(),
                reason: "no scripted page".to_string(),
            })
    }

    async fn capture_images(&self, url: &str, min_dimension: u32) -> FetchResult<Vec<PageImage>> {
        Ok(self
            .images
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|i| i.width >= min_dimension && i.height >= min_dimension)
            .collect())
    }

    async fn close(&self) -> FetchResult<()> {
        Ok(())
    }
}

/// Provider handing out one pre-built [`MockBrowserEngine`].
pub struct MockBrowserProvider {
    engine: Arc<MockBrowserEngine>,
}

impl MockBrowserProvider {
    pub fn new(engine: Arc<MockBrowserEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl BrowserProvider for MockBrowserProvider {
    async fn launch(&self) -> FetchResult<Arc<dyn BrowserEngine>> {
        Ok(self.engine.clone())
    }
}

/// A mock PDF engine with scripted text layer and OCR output.
///
/// Keyed by a marker byte string searched for in the document, so
/// tests can serve different "PDFs" from one engine.
#[derive(Default)]
pub struct MockPdfEngine {
    text_layers: RwLock<Vec<(Vec<u8>, String)>>,
    ocr_texts: RwLock<Vec<(Vec<u8>, String)>>,
    ocr_calls: RwLock<usize>,
}

impl MockPdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a text layer for documents containing `marker`.
    pub fn with_text_layer(self, marker: impl Into<Vec<u8>>, text: impl Into<String>) -> Self {
        self.text_layers
            .write()
            .unwrap()
            .push((marker.into(), text.into()));
        self
    }

    /// Script OCR output for documents containing `marker`.
    pub fn with_ocr_text(self, marker: impl Into<Vec<u8>>, text: impl Into<String>) -> Self {
        self.ocr_texts
            .write()
            .unwrap()
            .push((marker.into(), text.into()));
        self
    }

    /// How many times OCR was invoked.
    pub fn ocr_calls(&self) -> usize {
        *self.ocr_calls.read().unwrap()
    }
}

fn find_scripted(entries: &[(Vec<u8>, String)], data: &[u8]) -> Option<String> {
    entries
        .iter()
        .find(|(marker, _)| data.windows(marker.len().max(1)).any(|w| w == &marker[..]))
        .map(|(_, text)| text.clone())
}

#[async_trait]
impl PdfTextEngine for MockPdfEngine {
    async fn extract_text(&self, data: &[u8]) -> FetchResult<String> {
        Ok(find_scripted(&self.text_layers.read().unwrap(), data).unwrap_or_default())
    }

    async fn ocr_pages(
        &self,
        data: &[u8],
        _max_pages: usize,
        _languages: &str,
    ) -> FetchResult<String> {
        *self.ocr_calls.write().unwrap() += 1;
        Ok(find_scripted(&self.ocr_texts.read().unwrap(), data).unwrap_or_default())
    }
}

/// A mock OCR engine keyed the same way as [`MockPdfEngine`].
#[derive(Default)]
pub struct MockOcrEngine {
    texts: RwLock<Vec<(Vec<u8>, String)>>,
    calls: RwLock<usize>,
}

impl MockOcrEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script recognized text for images containing `marker`.
    pub fn with_text(self, marker: impl Into<Vec<u8>>, text: impl Into<String>) -> Self {
        self.texts.write().unwrap().push((marker.into(), text.into()));
        self
    }

    /// How many images were recognized.
    pub fn calls(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

#[async_trait]
impl OcrEngine for MockOcrEngine {
    async fn recognize(&self, image: &[u8], _languages: &str) -> FetchResult<String> {
        *self.calls.write().unwrap() += 1;
        Ok(find_scripted(&self.texts.read().unwrap(), image).unwrap_or_default())
    }
}
