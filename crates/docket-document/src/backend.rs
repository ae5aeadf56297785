//! Conversion backends
//!
//! A backend turns one file into text. The adapter holds a fast backend for
//! every document and builds an OCR-enabled one only when a scanned document
//! first needs it; [`BackendBuilder`] is the seam that construction goes
//! through.

use crate::config::DocumentConfig;
use crate::error::DocumentError;
use crate::native::NativeBackend;
use crate::ocr::OcrBackend;
use std::path::Path;
use std::sync::Arc;

/// Text produced by a backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversion {
    /// Markdown rendering
    pub markdown: String,
    /// Plain text rendering
    pub plain_text: String,
    /// Number of pages, when known
    pub page_count: Option<usize>,
}

/// Turns files into text
pub trait ConversionBackend: Send + Sync {
    /// Short name recorded in metadata
    fn name(&self) -> &'static str;

    /// Whether this backend recognizes text from page images
    fn ocr_enabled(&self) -> bool;

    /// Convert the file at `path`
    fn convert(&self, path: &Path) -> Result<Conversion, DocumentError>;
}

/// Constructs backends
pub trait BackendBuilder: Send + Sync {
    /// Build a backend, OCR-enabled or not
    fn build(
        &self,
        config: &DocumentConfig,
        ocr: bool,
    ) -> Result<Arc<dyn ConversionBackend>, DocumentError>;
}

/// Builds [`NativeBackend`] for the fast path and [`OcrBackend`] for OCR
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBackendBuilder;

impl BackendBuilder for DefaultBackendBuilder {
    fn build(
        &self,
        config: &DocumentConfig,
        ocr: bool,
    ) -> Result<Arc<dyn ConversionBackend>, DocumentError> {
        if ocr {
            Ok(Arc::new(OcrBackend::new(config)?))
        } else {
            Ok(Arc::new(NativeBackend::new(config)))
        }
    }
}
