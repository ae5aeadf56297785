//! Document extraction adapter
//!
//! Turns one file path into an [`ExtractedDocument`]. Digital documents go
//! through the fast backend built at construction. Scanned documents go
//! through an OCR-enabled backend that is built the first time one is seen
//! and then reused for the lifetime of the adapter.

use crate::backend::{BackendBuilder, ConversionBackend, DefaultBackendBuilder};
use crate::config::DocumentConfig;
use crate::detect::{LopdfSampler, PageSampler, ScanDetector};
use crate::error::DocumentError;
use crate::native::SUPPORTED_TYPES;
use docket_domain::{DocumentExtractor, DocumentMetadata, ExtractedDocument, ExtractionMethod};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// State of the lazily built OCR backend
enum OcrSlot {
    /// Not built yet
    Empty,
    /// Built and shared by every scanned document
    Ready(Arc<dyn ConversionBackend>),
    /// The OCR tool is missing; scanned documents use the fast path
    Unavailable,
}

/// Document extractor with scan detection and a lazily built OCR backend
pub struct DocumentAdapter {
    config: DocumentConfig,
    snapshot: serde_json::Value,
    builder: Arc<dyn BackendBuilder>,
    primary: Arc<dyn ConversionBackend>,
    ocr_cache: Mutex<OcrSlot>,
    detector: ScanDetector,
}

impl DocumentAdapter {
    /// Create an adapter with the default backends and lopdf scan sampling
    ///
    /// Fails when the configuration is invalid or when `do_ocr` is set and the
    /// OCR tool cannot be used.
    pub fn new(config: DocumentConfig) -> Result<Self, DocumentError> {
        Self::with_components(config, Arc::new(DefaultBackendBuilder), Arc::new(LopdfSampler))
    }

    /// Create an adapter with explicit backend construction and page sampling
    pub fn with_components(
        config: DocumentConfig,
        builder: Arc<dyn BackendBuilder>,
        sampler: Arc<dyn PageSampler>,
    ) -> Result<Self, DocumentError> {
        config.validate().map_err(DocumentError::Config)?;

        let primary = builder.build(&config, config.do_ocr)?;
        let detector = ScanDetector::new(&config, sampler);
        info!(
            "Document adapter ready (backend {}, do_ocr={}, auto_ocr_detection={})",
            primary.name(),
            config.do_ocr,
            config.auto_ocr_detection
        );

        Ok(Self {
            snapshot: config.snapshot(),
            config,
            builder,
            primary,
            ocr_cache: Mutex::new(OcrSlot::Empty),
            detector,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Whether the OCR backend has been built and cached
    pub fn ocr_backend_cached(&self) -> bool {
        matches!(*self.cache(), OcrSlot::Ready(_))
    }

    /// Whether building the OCR backend failed because the tool is missing
    pub fn ocr_unavailable(&self) -> bool {
        matches!(*self.cache(), OcrSlot::Unavailable)
    }

    fn cache(&self) -> MutexGuard<'_, OcrSlot> {
        self.ocr_cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cached OCR backend, building it on first use
    ///
    /// The lock is held across construction so concurrent callers build at
    /// most one instance. A missing tool is remembered so it is probed once;
    /// other build failures are retried on the next scanned document.
    fn ocr_backend(&self) -> Option<Arc<dyn ConversionBackend>> {
        let mut cache = self.cache();
        match &*cache {
            OcrSlot::Ready(backend) => return Some(Arc::clone(backend)),
            OcrSlot::Unavailable => return None,
            OcrSlot::Empty => {}
        }

        match self.builder.build(&self.config, true) {
            Ok(backend) => {
                info!("Built OCR backend {} for scanned documents", backend.name());
                *cache = OcrSlot::Ready(Arc::clone(&backend));
                Some(backend)
            }
            Err(e @ DocumentError::OcrUnavailable(_)) => {
                warn!("OCR backend unavailable, scanned documents use the fast path: {}", e);
                *cache = OcrSlot::Unavailable;
                None
            }
            Err(e) => {
                warn!("OCR backend unavailable, using fast path: {}", e);
                None
            }
        }
    }

    /// Choose the backend for `path`, recording the OCR decision in `metadata`
    fn select_backend(
        &self,
        path: &Path,
        metadata: &mut DocumentMetadata,
    ) -> Arc<dyn ConversionBackend> {
        if self.config.do_ocr {
            metadata.needs_ocr = true;
            return Arc::clone(&self.primary);
        }
        if !self.config.auto_ocr_detection {
            return Arc::clone(&self.primary);
        }

        if !self.detector.needs_ocr(path) {
            return Arc::clone(&self.primary);
        }

        info!("{} looks scanned, routing to OCR", metadata.file_name);
        metadata.needs_ocr = true;
        metadata.ocr_auto_detected = true;
        self.ocr_backend()
            .unwrap_or_else(|| Arc::clone(&self.primary))
    }
}

impl DocumentExtractor for DocumentAdapter {
    fn extract(&self, path: &Path) -> ExtractedDocument {
        let mut metadata = DocumentMetadata::for_path(path, self.snapshot.clone());

        if !SUPPORTED_TYPES.contains(&metadata.file_type.as_str()) {
            let err = DocumentError::UnsupportedType(metadata.file_type.clone());
            warn!("Skipping {}: {}", metadata.file_name, err);
            return ExtractedDocument::failed(metadata, err.to_string());
        }

        let backend = self.select_backend(path, &mut metadata);
        metadata.backend = Some(backend.name().to_string());

        let result = match backend.convert(path) {
            Err(e) if backend.ocr_enabled() && !Arc::ptr_eq(&backend, &self.primary) => {
                warn!("OCR failed for {}, retrying fast path: {}", metadata.file_name, e);
                metadata.backend = Some(self.primary.name().to_string());
                self.primary.convert(path).map(|c| (c, self.primary.ocr_enabled()))
            }
            other => other.map(|c| (c, backend.ocr_enabled())),
        };

        match result {
            Ok((conversion, used_ocr)) => {
                metadata.extraction_method = if used_ocr {
                    ExtractionMethod::Ocr
                } else {
                    ExtractionMethod::Normal
                };
                metadata.page_count = conversion.page_count;
                debug!(
                    "Extracted {} chars from {} ({})",
                    conversion.plain_text.len(),
                    metadata.file_name,
                    metadata.extraction_method
                );
                ExtractedDocument::new(conversion.markdown, conversion.plain_text, metadata)
            }
            Err(e) => {
                warn!("Extraction failed for {}: {}", metadata.file_name, e);
                ExtractedDocument::failed(metadata, e.to_string())
            }
        }
    }

    fn supported_types(&self) -> &[&'static str] {
        &SUPPORTED_TYPES
    }
}

impl std::fmt::Debug for DocumentAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentAdapter")
            .field("config", &self.config)
            .field("primary", &self.primary.name())
            .field("ocr_cached", &self.ocr_backend_cached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Conversion;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubBackend {
        ocr: bool,
        fail: bool,
    }

    impl ConversionBackend for StubBackend {
        fn name(&self) -> &'static str {
            if self.ocr {
                "stub-ocr"
            } else {
                "stub-fast"
            }
        }

        fn ocr_enabled(&self) -> bool {
            self.ocr
        }

        fn convert(&self, path: &Path) -> Result<Conversion, DocumentError> {
            if self.fail {
                return Err(DocumentError::OcrFailed("engine crashed".to_string()));
            }
            let label = if self.ocr { "recognized" } else { "embedded" };
            Ok(Conversion {
                markdown: format!("{} text of {}", label, path.display()),
                plain_text: format!("{} text of {}", label, path.display()),
                page_count: Some(3),
            })
        }
    }

    #[derive(Default)]
    struct CountingBuilder {
        ocr_builds: AtomicUsize,
        fast_builds: AtomicUsize,
        ocr_unavailable: bool,
        ocr_fails: bool,
    }

    impl BackendBuilder for CountingBuilder {
        fn build(
            &self,
            _config: &DocumentConfig,
            ocr: bool,
        ) -> Result<Arc<dyn ConversionBackend>, DocumentError> {
            if ocr {
                self.ocr_builds.fetch_add(1, Ordering::SeqCst);
                if self.ocr_unavailable {
                    return Err(DocumentError::OcrUnavailable("not installed".to_string()));
                }
            } else {
                self.fast_builds.fetch_add(1, Ordering::SeqCst);
            }
            Ok(Arc::new(StubBackend {
                ocr,
                fail: ocr && self.ocr_fails,
            }))
        }
    }

    /// Samples no text for names containing "scan", plenty otherwise
    struct NameSampler;

    impl PageSampler for NameSampler {
        fn sample_text(&self, path: &Path, _max_pages: usize) -> Result<Vec<String>, DocumentError> {
            let name = path.to_string_lossy();
            if name.contains("corrupt") {
                Err(DocumentError::Pdf("invalid xref".to_string()))
            } else if name.contains("scan") {
                Ok(vec![String::new(), " ".to_string(), "1".to_string()])
            } else {
                Ok(vec!["The parties entered into a settlement agreement on June 1, 2021.".to_string()])
            }
        }
    }

    fn adapter_with(builder: Arc<CountingBuilder>, config: DocumentConfig) -> DocumentAdapter {
        DocumentAdapter::with_components(config, builder, Arc::new(NameSampler)).unwrap()
    }

    #[test]
    fn test_digital_pdf_uses_fast_path() {
        let builder = Arc::new(CountingBuilder::default());
        let adapter = adapter_with(builder.clone(), DocumentConfig::default());

        let doc = adapter.extract(Path::new("/cases/digital.pdf"));
        assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Normal);
        assert!(!doc.metadata.needs_ocr);
        assert!(!doc.metadata.ocr_auto_detected);
        assert_eq!(doc.metadata.backend.as_deref(), Some("stub-fast"));
        assert!(doc.plain_text.starts_with("embedded"));
        assert_eq!(builder.ocr_builds.load(Ordering::SeqCst), 0);
        assert!(!adapter.ocr_backend_cached());
    }

    #[test]
    fn test_scanned_documents_share_one_ocr_backend() {
        let builder = Arc::new(CountingBuilder::default());
        let adapter = adapter_with(builder.clone(), DocumentConfig::default());

        let first = adapter.extract(Path::new("/cases/scan_1.pdf"));
        let digital = adapter.extract(Path::new("/cases/digital.pdf"));
        let second = adapter.extract(Path::new("/cases/scan_2.pdf"));

        for doc in [&first, &second] {
            assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Ocr);
            assert!(doc.metadata.needs_ocr);
            assert!(doc.metadata.ocr_auto_detected);
            assert!(doc.plain_text.starts_with("recognized"));
        }
        assert_eq!(digital.metadata.extraction_method, ExtractionMethod::Normal);
        assert_eq!(builder.ocr_builds.load(Ordering::SeqCst), 1);
        assert_eq!(builder.fast_builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_scans_build_ocr_once() {
        let builder = Arc::new(CountingBuilder::default());
        let adapter = Arc::new(adapter_with(builder.clone(), DocumentConfig::default()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let adapter = Arc::clone(&adapter);
                std::thread::spawn(move || adapter.extract(Path::new(&format!("scan_{}.pdf", i))))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().metadata.extraction_method, ExtractionMethod::Ocr);
        }
        assert_eq!(builder.ocr_builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detection_failure_falls_back_to_fast_path() {
        let builder = Arc::new(CountingBuilder::default());
        let adapter = adapter_with(builder.clone(), DocumentConfig::default());

        let doc = adapter.extract(Path::new("/cases/corrupt.pdf"));
        assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Normal);
        assert!(!doc.metadata.needs_ocr);
        assert_eq!(builder.ocr_builds.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_detection_disabled_skips_sampling() {
        let builder = Arc::new(CountingBuilder::default());
        let config = DocumentConfig {
            auto_ocr_detection: false,
            ..DocumentConfig::default()
        };
        let adapter = adapter_with(builder.clone(), config);

        let doc = adapter.extract(Path::new("/cases/scan_1.pdf"));
        assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Normal);
        assert!(!doc.metadata.needs_ocr);
        assert!(!doc.metadata.ocr_auto_detected);
        assert_eq!(builder.ocr_builds.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_forced_ocr_uses_primary() {
        let builder = Arc::new(CountingBuilder::default());
        let config = DocumentConfig {
            do_ocr: true,
            ..DocumentConfig::default()
        };
        let adapter = adapter_with(builder.clone(), config);

        let doc = adapter.extract(Path::new("/cases/digital.pdf"));
        assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Ocr);
        assert!(doc.metadata.needs_ocr);
        assert!(!doc.metadata.ocr_auto_detected);
        // Built once as the primary, never again lazily
        assert_eq!(builder.ocr_builds.load(Ordering::SeqCst), 1);
        assert!(!adapter.ocr_backend_cached());
    }

    #[test]
    fn test_unavailable_ocr_is_probed_once() {
        let builder = Arc::new(CountingBuilder {
            ocr_unavailable: true,
            ..CountingBuilder::default()
        });
        let adapter = adapter_with(builder.clone(), DocumentConfig::default());

        let doc = adapter.extract(Path::new("scan_a.pdf"));
        assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Normal);
        assert!(doc.metadata.needs_ocr);
        assert!(doc.metadata.ocr_auto_detected);
        let second = adapter.extract(Path::new("scan_b.pdf"));
        assert_eq!(second.metadata.extraction_method, ExtractionMethod::Normal);
        assert!(second.metadata.needs_ocr);
        adapter.extract(Path::new("scan_c.pdf"));

        assert_eq!(builder.ocr_builds.load(Ordering::SeqCst), 1);
        assert!(!adapter.ocr_backend_cached());
        assert!(adapter.ocr_unavailable());
    }

    #[test]
    fn test_ocr_conversion_failure_retries_fast_path() {
        let builder = Arc::new(CountingBuilder {
            ocr_fails: true,
            ..CountingBuilder::default()
        });
        let adapter = adapter_with(builder, DocumentConfig::default());

        let doc = adapter.extract(Path::new("scan_a.pdf"));
        assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Normal);
        assert_eq!(doc.metadata.backend.as_deref(), Some("stub-fast"));
        assert!(doc.metadata.needs_ocr);
    }

    #[test]
    fn test_unsupported_type_is_failed_document() {
        let adapter = adapter_with(Arc::new(CountingBuilder::default()), DocumentConfig::default());

        let doc = adapter.extract(Path::new("photo.jpeg"));
        assert!(doc.is_failed());
        assert!(doc.plain_text.is_empty());
        assert!(doc.metadata.error.as_deref().unwrap_or("").contains("jpeg"));
    }

    #[test]
    fn test_metadata_carries_config_snapshot() {
        let adapter = adapter_with(Arc::new(CountingBuilder::default()), DocumentConfig::default());

        let doc = adapter.extract(Path::new("digital.pdf"));
        let map = doc.metadata.to_map();
        assert_eq!(map["config"]["detection_min_chars"], serde_json::json!(50));
        assert_eq!(map["pageCount"], serde_json::json!(3));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DocumentConfig {
            detection_sample_pages: 0,
            ..DocumentConfig::default()
        };
        let result = DocumentAdapter::with_components(
            config,
            Arc::new(CountingBuilder::default()),
            Arc::new(NameSampler),
        );
        assert!(matches!(result, Err(DocumentError::Config(_))));
    }

    #[test]
    fn test_missing_file_never_raises() {
        let adapter = DocumentAdapter::new(DocumentConfig::default()).unwrap();
        let doc = adapter.extract(Path::new("/nonexistent/dir/filing.pdf"));
        assert!(doc.is_failed());
        assert!(doc.metadata.error.is_some());
    }
}
