//! TTL cache for fetched menu content.
//!
//! A [`CacheBackend`] is a plain key/value store with per-entry
//! expiry; [`MenuCache`] layers content namespacing (kind + URL hash)
//! and per-kind TTLs on top. Backend failures always degrade to a
//! cache miss: an unavailable cache must never block a fetch.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryCache;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCache;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::CacheResult;

/// Swappable key/value backend with TTL semantics.
///
/// Contract: a read past expiry is equivalent to a miss, and the
/// backend lazily evicts the expired entry. Writes are idempotent
/// upserts; concurrent writers racing on one key are safe (last
/// write wins, content is expected to be equivalent).
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Read a value; expired entries read as `None`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Upsert a value with a time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Remove a value.
    async fn delete(&self, key: &str) -> CacheResult<()>;
}

/// What kind of content a cache entry holds. Determines the key
/// namespace and the TTL: rendered/static HTML changes often, PDF and
/// OCR text rarely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Raw rendered or fetched HTML.
    Html,
    /// Extracted page text.
    Text,
    /// PDF text (direct or OCR).
    Pdf,
    /// OCR text from page images.
    ImageOcr,
}

impl CacheKind {
    fn prefix(&self) -> &'static str {
        match self {
            CacheKind::Html => "html",
            CacheKind::Text => "text",
            CacheKind::Pdf => "pdf",
            CacheKind::ImageOcr => "img_ocr",
        }
    }
}

/// High-level menu content cache.
#[derive(Clone)]
pub struct MenuCache {
    backend: Arc<dyn CacheBackend>,
    html_ttl: Duration,
    pdf_ttl: Duration,
}

impl MenuCache {
    /// Create a cache over a backend with TTLs from `config`.
    pub fn new(backend: Arc<dyn CacheBackend>, config: &FetchConfig) -> Self {
        Self {
            backend,
            html_ttl: config.html_ttl,
            pdf_ttl: config.pdf_ttl,
        }
    }

    /// In-memory cache with default TTLs, for tests and defaults.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()), &FetchConfig::default())
    }

    /// Stable namespaced key: `{kind}:{hex(sha256(url ":" extra))[..16]}`.
    fn make_key(kind: CacheKind, url: &str, extra: &str) -> String {
        let digest = Sha256::digest(format!("{url}:{extra}").as_bytes());
        format!("{}:{}", kind.prefix(), &hex::encode(digest)[..16])
    }

    /// Read cached content for a URL; backend errors read as a miss.
    pub async fn get(&self, kind: CacheKind, url: &str) -> Option<String> {
        let key = Self::make_key(kind, url, "");
        match self.backend.get(&key).await {
            Ok(Some(value)) => {
                debug!(url = %url, kind = kind.prefix(), "cache hit");
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(url = %url, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store content for a URL with the kind's TTL. Write failures
    /// are logged and swallowed.
    pub async fn set(&self, kind: CacheKind, url: &str, value: &str) {
        let key = Self::make_key(kind, url, "");
        let ttl = match kind {
            CacheKind::Html | CacheKind::Text => self.html_ttl,
            CacheKind::Pdf | CacheKind::ImageOcr => self.pdf_ttl,
        };
        if let Err(e) = self.backend.set(&key, value, ttl).await {
            warn!(url = %url, error = %e, "cache write failed");
        }
    }

    /// Drop cached content for a URL.
    pub async fn invalidate(&self, kind: CacheKind, url: &str) {
        let key = Self::make_key(kind, url, "");
        if let Err(e) = self.backend.delete(&key).await {
            warn!(url = %url, error = %e, "cache delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let cache = MenuCache::in_memory();
        cache.set(CacheKind::Text, "https://a.example", "меню текст").await;
        let got = cache.get(CacheKind::Text, "https://a.example").await;
        assert_eq!(got.as_deref(), Some("меню текст"));
    }

    #[tokio::test]
    async fn kinds_are_namespaced() {
        let cache = MenuCache::in_memory();
        cache.set(CacheKind::Text, "https://a.example", "text").await;
        assert_eq!(cache.get(CacheKind::Html, "https://a.example").await, None);
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = MenuCache::in_memory();
        cache.set(CacheKind::Pdf, "https://a.example/m.pdf", "pdf").await;
        cache.invalidate(CacheKind::Pdf, "https://a.example/m.pdf").await;
        assert_eq!(cache.get(CacheKind::Pdf, "https://a.example/m.pdf").await, None);
    }

    /// Backend that always fails, for degradation tests.
    struct BrokenBackend;

    #[async_trait]
    impl CacheBackend for BrokenBackend {
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            Err(CacheError::Backend("down".into()))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
            Err(CacheError::Backend("down".into()))
        }
        async fn delete(&self, _key: &str) -> CacheResult<()> {
            Err(CacheError::Backend("down".into()))
        }
    }

    #[tokio::test]
    async fn backend_errors_degrade_to_miss() {
        let cache = MenuCache::new(Arc::new(BrokenBackend), &FetchConfig::default());
        cache.set(CacheKind::Text, "https://a.example", "v").await;
        assert_eq!(cache.get(CacheKind::Text, "https://a.example").await, None);
    }
}
