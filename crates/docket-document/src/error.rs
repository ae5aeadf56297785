//! Error types for document extraction

use thiserror::Error;

/// Errors that can occur while turning a file into text
#[derive(Error, Debug)]
pub enum DocumentError {
    /// File could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Extension is not handled by any backend
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// PDF could not be parsed
    #[error("PDF error: {0}")]
    Pdf(String),

    /// The OCR tool is missing or unusable
    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    /// The OCR tool ran but failed
    #[error("OCR failed: {0}")]
    OcrFailed(String),

    /// Conversion exceeded the document timeout (seconds)
    #[error("Document conversion timed out after {0}s")]
    Timeout(u64),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<lopdf::Error> for DocumentError {
    fn from(e: lopdf::Error) -> Self {
        DocumentError::Pdf(e.to_string())
    }
}
