//! Trait abstractions for external collaborators.
//!
//! The pipeline core never talks to a geo provider, a headless
//! browser, an OCR binary, or a PDF library directly; it goes through
//! these narrow seams. Mock implementations live in
//! [`crate::testing`].

pub mod directory;
pub mod engines;
pub mod site_finder;

pub use directory::PlaceDirectory;
pub use engines::{
    BrowserEngine, BrowserProvider, NoBrowser, OcrEngine, PageImage, PdfTextEngine, RenderedPage,
    SharedBrowser,
};
pub use site_finder::{SiteFinder, WebSearcher};
