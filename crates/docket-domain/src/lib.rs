//! Docket Domain Layer
//!
//! Core data model for the event extraction pipeline. Every other crate in the
//! workspace depends on these types and on the two adapter traits defined in
//! [`traits`].
//!
//! ## Key Concepts
//!
//! - **ExtractedDocument**: normalized text and audit metadata for one input file
//! - **EventRecord**: one row of the canonical five-column output table
//! - **FailureReason**: why a stage produced no usable events
//! - **TimingMetrics**: document-level stage durations shared by its records
//!
//! ## Architecture
//!
//! This crate holds no I/O. Adapters that talk to files, subprocesses or remote
//! providers live in `docket-document` and `docket-llm`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod event;
pub mod failure;
pub mod timing;
pub mod traits;

// Re-exports for convenience
pub use document::{DocumentMetadata, ExtractedDocument, ExtractionMethod, Metadata};
pub use event::{CharInterval, EventAttributes, EventRecord, TokenUsage};
pub use failure::FailureReason;
pub use timing::TimingMetrics;
pub use traits::{DocumentExtractor, EventExtractor};
