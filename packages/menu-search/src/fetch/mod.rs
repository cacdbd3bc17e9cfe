//! Content acquisition strategies.
//!
//! Each fetcher turns a URL into a [`FetchOutcome`] and hides its own
//! transport details: HTTP retries and per-domain pacing for static
//! pages, text-layer/OCR fallback for PDFs, a shared headless browser
//! for script-rendered sites, and OCR over page images for menus
//! published as pictures. All fetchers read and write the shared
//! [`MenuCache`](crate::cache::MenuCache) so one search never hits the
//! same URL twice.

mod browser;
mod html;
mod image_ocr;
mod pdf;
mod rate_limit;
mod static_html;

pub use browser::BrowserFetcher;
pub use html::{extract_links, fragment_anchors, html_to_text, Link};
pub use image_ocr::{is_image_based_menu, ImageOcrFetcher, ImageScanOutcome};
pub use pdf::{is_pdf_url, PdfFetcher};
pub use rate_limit::DomainLimiter;
pub use static_html::StaticFetcher;

pub use crate::types::menu::{FetchOutcome, MenuContent, MenuSource};
