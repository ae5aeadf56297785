//! Scan detection
//!
//! Samples the first pages of a PDF for an embedded text layer. A document
//! whose sampled pages hold fewer non-whitespace characters than the
//! threshold is classified as scanned. Any sampling error classifies the
//! document as digital so the expensive OCR path is skipped.

use crate::config::DocumentConfig;
use crate::error::DocumentError;
use crate::native::{file_type, pdf_page_texts};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads the embedded text of the first pages of a document
pub trait PageSampler: Send + Sync {
    /// Text of up to `max_pages` leading pages
    fn sample_text(&self, path: &Path, max_pages: usize) -> Result<Vec<String>, DocumentError>;
}

/// Samples PDF text layers with lopdf
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfSampler;

impl PageSampler for LopdfSampler {
    fn sample_text(&self, path: &Path, max_pages: usize) -> Result<Vec<String>, DocumentError> {
        pdf_page_texts(path, Some(max_pages)).map(|(pages, _)| pages)
    }
}

/// Classifies documents as scanned or digital
#[derive(Clone)]
pub struct ScanDetector {
    sampler: Arc<dyn PageSampler>,
    sample_pages: usize,
    min_chars: usize,
}

impl ScanDetector {
    /// Create a detector using the sampling limits from `config`
    pub fn new(config: &DocumentConfig, sampler: Arc<dyn PageSampler>) -> Self {
        Self {
            sampler,
            sample_pages: config.detection_sample_pages,
            min_chars: config.detection_min_chars,
        }
    }

    /// Whether the document at `path` lacks a usable text layer
    ///
    /// Only PDFs are sampled; other formats are always digital.
    pub fn needs_ocr(&self, path: &Path) -> bool {
        if file_type(path) != "pdf" {
            return false;
        }

        let pages = match self.sampler.sample_text(path, self.sample_pages) {
            Ok(pages) => pages,
            Err(e) => {
                warn!(
                    "Scan detection failed for {}, treating as digital: {}",
                    path.display(),
                    e
                );
                return false;
            }
        };

        let chars: usize = pages
            .iter()
            .map(|page| page.chars().filter(|c| !c.is_whitespace()).count())
            .sum();
        let scanned = chars < self.min_chars;

        debug!(
            "Sampled {} page(s) of {}: {} chars, {}",
            pages.len(),
            path.display(),
            chars,
            if scanned { "scanned" } else { "digital" }
        );
        scanned
    }
}

impl std::fmt::Debug for ScanDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanDetector")
            .field("sample_pages", &self.sample_pages)
            .field("min_chars", &self.min_chars)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSampler(Result<Vec<&'static str>, &'static str>);

    impl PageSampler for FixedSampler {
        fn sample_text(&self, _path: &Path, max_pages: usize) -> Result<Vec<String>, DocumentError> {
            match &self.0 {
                Ok(pages) => Ok(pages.iter().take(max_pages).map(|p| p.to_string()).collect()),
                Err(msg) => Err(DocumentError::Pdf(msg.to_string())),
            }
        }
    }

    fn detector(sampler: FixedSampler) -> ScanDetector {
        ScanDetector::new(&DocumentConfig::default(), Arc::new(sampler))
    }

    #[test]
    fn test_scanned_when_sampled_text_is_short() {
        let d = detector(FixedSampler(Ok(vec!["  ", "p. 2", "\n"])));
        assert!(d.needs_ocr(Path::new("scan.pdf")));
    }

    #[test]
    fn test_digital_when_text_layer_present() {
        let text = "The plaintiff filed a complaint on January 3, 2020 in the district court.";
        let d = detector(FixedSampler(Ok(vec![text])));
        assert!(!d.needs_ocr(Path::new("brief.pdf")));
    }

    #[test]
    fn test_threshold_counts_across_sampled_pages() {
        // 30 + 30 non-whitespace chars across two pages reach the default 50
        let page = "abcdefghij abcdefghij abcdefghij";
        let d = detector(FixedSampler(Ok(vec![page, page])));
        assert!(!d.needs_ocr(Path::new("split.pdf")));
    }

    #[test]
    fn test_only_first_pages_sampled() {
        let text = "abcdefghijabcdefghijabcdefghijabcdefghijabcdefghijabcdefghij";
        let d = detector(FixedSampler(Ok(vec!["", "", "", text])));
        assert!(d.needs_ocr(Path::new("late_text.pdf")));
    }

    #[test]
    fn test_sampling_error_fails_safe_to_digital() {
        let d = detector(FixedSampler(Err("xref table is corrupt")));
        assert!(!d.needs_ocr(Path::new("corrupt.pdf")));
    }

    #[test]
    fn test_non_pdf_never_sampled() {
        let d = detector(FixedSampler(Ok(vec![])));
        assert!(!d.needs_ocr(Path::new("notes.txt")));
    }

    #[test]
    fn test_lopdf_sampler_on_garbage_fails_safe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let d = ScanDetector::new(&DocumentConfig::default(), Arc::new(LopdfSampler));
        assert!(!d.needs_ocr(&path));
    }
}
