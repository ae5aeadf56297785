//! Document module - the normalized text produced for one input file

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Loosely typed metadata bag passed from the document stage to event adapters
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key holding the source file name
pub const FILE_NAME_KEY: &str = "fileName";

/// Metadata key holding the source file path
pub const FILE_PATH_KEY: &str = "filePath";

/// Name used when no file name can be recovered from metadata
pub const UNKNOWN_DOCUMENT: &str = "Unknown document";

/// How the text of a document was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Embedded text layer or plain text read directly
    Normal,
    /// Text recognized from page images
    Ocr,
    /// Extraction failed; the text is empty
    Failed,
}

impl ExtractionMethod {
    /// Lowercase label used in metadata and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Normal => "normal",
            ExtractionMethod::Ocr => "ocr",
            ExtractionMethod::Failed => "failed",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit metadata recorded for every extraction, whatever branch was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// File name without directories
    pub file_name: String,

    /// Path as given by the caller
    pub file_path: String,

    /// Lowercased extension, empty when the file has none
    pub file_type: String,

    /// Branch that produced the text
    pub extraction_method: ExtractionMethod,

    /// Whether the document was processed with OCR
    pub needs_ocr: bool,

    /// Whether OCR was chosen by scan detection rather than forced by configuration
    pub ocr_auto_detected: bool,

    /// Number of pages, when the backend knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,

    /// Name of the conversion backend that ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    /// Snapshot of the document configuration in effect
    pub config: Value,

    /// Error message when extraction failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentMetadata {
    /// Create metadata for a path with the normal method and no OCR flags set
    pub fn for_path(path: &Path, config: Value) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNKNOWN_DOCUMENT.to_string());
        let file_type = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            file_name,
            file_path: path.display().to_string(),
            file_type,
            extraction_method: ExtractionMethod::Normal,
            needs_ocr: false,
            ocr_auto_detected: false,
            page_count: None,
            backend: None,
            config,
            error: None,
        }
    }

    /// Convert into the loosely typed bag handed to event adapters
    pub fn to_map(&self) -> Metadata {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => {
                // Serialization of this struct cannot produce a non-object; keep the name at least
                let mut map = Metadata::new();
                map.insert(FILE_NAME_KEY.to_string(), Value::String(self.file_name.clone()));
                map
            }
        }
    }
}

/// Text and metadata produced once per input file
///
/// Immutable once returned by a document extractor. `plain_text` is the
/// canonical input to event extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    /// Markdown rendering of the document
    pub markdown: String,

    /// Plain text rendering of the document
    pub plain_text: String,

    /// Audit metadata
    pub metadata: DocumentMetadata,
}

impl ExtractedDocument {
    /// Create a successfully extracted document
    pub fn new(markdown: String, plain_text: String, metadata: DocumentMetadata) -> Self {
        Self {
            markdown,
            plain_text,
            metadata,
        }
    }

    /// Create a failed document with empty text and the error recorded in metadata
    pub fn failed(mut metadata: DocumentMetadata, error: impl Into<String>) -> Self {
        metadata.extraction_method = ExtractionMethod::Failed;
        metadata.error = Some(error.into());
        Self {
            markdown: String::new(),
            plain_text: String::new(),
            metadata,
        }
    }

    /// Whether extraction failed totally
    pub fn is_failed(&self) -> bool {
        self.metadata.extraction_method == ExtractionMethod::Failed
    }

    /// Source file name
    pub fn file_name(&self) -> &str {
        &self.metadata.file_name
    }
}

/// Recover the source document name from a metadata bag
///
/// Prefers `fileName`, then the last component of `filePath`.
pub fn document_name_from(metadata: &Metadata) -> String {
    if let Some(name) = metadata.get(FILE_NAME_KEY).and_then(Value::as_str) {
        if !name.trim().is_empty() {
            return name.to_string();
        }
    }
    metadata
        .get(FILE_PATH_KEY)
        .and_then(Value::as_str)
        .and_then(|p| Path::new(p).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| UNKNOWN_DOCUMENT.to_string())
}
