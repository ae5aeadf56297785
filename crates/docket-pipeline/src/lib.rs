//! Docket Pipeline
//!
//! Orchestrates document extraction and event extraction into a fixed
//! five-column event table.
//!
//! # Architecture
//!
//! ```text
//! AppConfig ─> registry ─> CredentialGate ─> adapters
//!
//! path ─> DocumentExtractor ─> EventExtractor ─> number / stamp / time ─> EventTable
//! ```
//!
//! Configuration and credential problems fail fast with
//! [`PipelineError::Configuration`] or [`PipelineError::Validation`] before
//! any request is made. Failures while processing a document never abort a
//! run; they become a single fallback record for that document.
//!
//! # Examples
//!
//! ```
//! use docket_domain::EventRecord;
//! use docket_document::{DocumentAdapter, DocumentConfig};
//! use docket_llm::MockEventExtractor;
//! use docket_pipeline::{EventTable, Pipeline, PipelineOptions};
//! use std::path::Path;
//!
//! let documents = DocumentAdapter::new(DocumentConfig::fast()).unwrap();
//! let events = MockEventExtractor::new(vec![EventRecord::new("Complaint filed.", "", "")]);
//! let pipeline = Pipeline::new(Box::new(documents), Box::new(events), PipelineOptions::default());
//!
//! // An unreadable file still yields one row
//! let report = pipeline.process_documents(&[Path::new("/nonexistent/complaint.pdf")]);
//! assert_eq!(report.total_events(), 1);
//!
//! let table = EventTable::build(&report.into_records(), &[]).unwrap();
//! assert_eq!(table.headers()[4], "Document Reference");
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod error;
pub mod formatter;
pub mod pipeline;
pub mod registry;


pub use config::{AppConfig, DocumentFailurePolicy, PipelineOptions};
pub use credentials::CredentialGate;
pub use error::PipelineError;
pub use formatter::{
    validate_records, Cell, EventTable, ExportFormat, ExtraColumn, TableSummary,
    CANONICAL_COLUMNS,
};
pub use pipeline::{DocumentReport, Pipeline, RunReport};
pub use registry::{create_document_extractor, create_event_extractor};
