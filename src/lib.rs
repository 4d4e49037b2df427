//! # hwpcorpus
//!
//! Batch extraction of HWP-family Korean word processor documents into a
//! normalized logical model, emitted as YAML or JSONL corpus records for
//! machine-learning pipelines.
//!
//! ## Supported formats
//!
//! - **HWP 5.x**: binary format in OLE containers (most common)
//! - **HWPX**: XML-in-ZIP successor format
//! - **HWP 3.x**: detected by triage and rejected (no native parsing)
//!
//! ## Quick start
//!
//! ```no_run
//! use hwpcorpus::{extract_structure, extract_text};
//!
//! // Fast flat-text extraction (preview stream when available)
//! let result = extract_text("document.hwp");
//! if result.success {
//!     println!("{}", result.text.unwrap());
//! }
//!
//! // Structure-preserving extraction (sections, paragraphs, tables)
//! let structured = extract_structure("document.hwp");
//! if let Some(doc) = structured.document {
//!     println!("{} tables", doc.all_tables().len());
//! }
//! ```

pub mod batch;
pub mod detect;
pub mod error;
pub mod export;
pub mod extract;
pub mod hwp5;
pub mod hwpx;
pub mod model;

// Re-exports
pub use batch::{discover_files, BatchProcessor, BatchResult, DEFAULT_TIMEOUT_SECS};
pub use detect::{detect_format_from_bytes, detect_format_from_path, FormatType};
pub use error::{Error, Result};
pub use export::{MetadataMapper, TrainingData, YamlExporter};
pub use extract::{extract_structure, extract_text, ExtractResult, Method, StructuredResult};
pub use hwp5::{Hwp5Parser, HwpMetadata};
pub use hwpx::HwpxParser;
pub use model::{Document, Paragraph, Section, Table, TableCell};

use std::path::Path;

/// Parses a document into the logical model.
///
/// Detects the format and dispatches to the matching parser. Prefer
/// [`extract_structure`] when a non-panicking result object is wanted.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();

    match detect::detect_format_from_path(path)? {
        FormatType::Hwp5 => Hwp5Parser::open(path)?.parse(),
        FormatType::Hwpx => HwpxParser::open(path)?.parse(),
        FormatType::Hwp3 => Err(Error::Unsupported("HWP 3.x".into())),
    }
}
