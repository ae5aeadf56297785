//! Docket Document Layer
//!
//! Turns input files into normalized text for event extraction.
//!
//! # Architecture
//!
//! ```text
//! path ─> ScanDetector ─┬─ digital ─> primary backend (built eagerly)
//!                       └─ scanned ─> OCR backend (built once, cached)
//!                                        │
//!                                        v
//!                              ExtractedDocument + metadata
//! ```
//!
//! Extraction never fails past [`DocumentAdapter`]: an unreadable file comes
//! back with empty text and `extractionMethod = failed`.
//!
//! # Examples
//!
//! ```
//! use docket_document::{DocumentAdapter, DocumentConfig};
//! use docket_domain::{DocumentExtractor, ExtractionMethod};
//! use std::path::Path;
//!
//! let adapter = DocumentAdapter::new(DocumentConfig::default()).unwrap();
//! let doc = adapter.extract(Path::new("/nonexistent/filing.txt"));
//! assert_eq!(doc.metadata.extraction_method, ExtractionMethod::Failed);
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod backend;
pub mod config;
pub mod detect;
pub mod error;
pub mod native;
pub mod ocr;

pub use adapter::DocumentAdapter;
pub use backend::{BackendBuilder, Conversion, ConversionBackend, DefaultBackendBuilder};
pub use config::{AcceleratorDevice, DocumentConfig, TableMode};
pub use detect::{LopdfSampler, PageSampler, ScanDetector};
pub use error::DocumentError;
pub use native::{NativeBackend, SUPPORTED_TYPES};
pub use ocr::OcrBackend;
