//! HWP 5.x binary format parser.
//!
//! HWP 5.x documents are OLE compound files: a `FileHeader` stream with
//! the signature and attribute flags, optional `PrvText` preview text,
//! and `BodyText/Section{i}` streams holding deflate-compressed record
//! sequences.

mod container;
mod header;
mod record;
mod structure;
mod text;

pub use container::{Hwp5Container, DEFAULT_MAX_FILE_SIZE};
pub use header::{FileHeader, Version};
pub use record::{Record, RecordIterator, TagId};
pub use structure::{extract_section_text, parse_section};
pub use text::decode_para_text;

use crate::error::{Error, Result};
use crate::model::Document;
use log::warn;
use serde::Serialize;
use std::path::Path;

/// Summary metadata for an opened HWP 5.x document.
#[derive(Debug, Clone, Serialize)]
pub struct HwpMetadata {
    /// Source file path
    pub filepath: String,
    /// Source file name
    pub filename: String,
    /// Version quad, e.g. "5.1.0.1"
    pub version: String,
    /// Body streams are compressed
    pub is_compressed: bool,
    /// File size in bytes
    pub file_size_bytes: u64,
    /// Stream paths inside the container
    pub streams: Vec<String>,
}

/// HWP 5.x document parser.
pub struct Hwp5Parser {
    container: Hwp5Container,
    header: FileHeader,
    metadata: HwpMetadata,
}

impl Hwp5Parser {
    /// Opens an HWP 5.x document, enforcing the default size ceiling.
    ///
    /// Fails with `Encrypted` when the encryption bit is set; encrypted
    /// documents are rejected outright.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_limit(path, DEFAULT_MAX_FILE_SIZE)
    }

    /// Opens an HWP 5.x document with an explicit size ceiling.
    pub fn open_with_limit(path: impl AsRef<Path>, max_size: u64) -> Result<Self> {
        let path = path.as_ref();
        let container = Hwp5Container::open_with_limit(path, max_size)?;
        let header = container.read_file_header()?;

        if header.is_encrypted() {
            return Err(Error::Encrypted);
        }

        let file_size = std::fs::metadata(path)?.len();
        let metadata = HwpMetadata {
            filepath: path.to_string_lossy().into_owned(),
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            version: header.version.to_string(),
            is_compressed: header.is_compressed(),
            file_size_bytes: file_size,
            streams: container.list_streams(),
        };

        Ok(Self {
            container,
            header,
            metadata,
        })
    }

    /// Returns the parsed file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Returns the document summary metadata.
    pub fn metadata(&self) -> &HwpMetadata {
        &self.metadata
    }

    /// Returns the PrvText preview text, if the stream is present.
    pub fn preview_text(&self) -> Option<String> {
        self.container.read_preview_text()
    }

    /// Extracts flat body text across all sections.
    pub fn body_text(&self) -> Result<String> {
        let mut texts = Vec::new();
        for (_, data) in self.read_sections() {
            let text = extract_section_text(&data);
            if !text.is_empty() {
                texts.push(text);
            }
        }
        Ok(texts.join("\n\n"))
    }

    /// Parses the document into the logical model.
    ///
    /// Sections are decoded in ascending stream index; a section whose
    /// payload cannot be read is skipped with a warning and the rest
    /// proceed.
    pub fn parse(&self) -> Result<Document> {
        let mut document = Document::new();

        for (index, data) in self.read_sections() {
            document.sections.push(parse_section(&data, index));
        }

        Ok(document)
    }

    /// Reads and decompresses every body section, skipping unreadable ones.
    fn read_sections(&self) -> Vec<(usize, Vec<u8>)> {
        let compressed = self.header.is_compressed();
        self.container
            .list_bodytext_sections()
            .iter()
            .enumerate()
            .filter_map(|(index, name)| {
                match self.container.read_stream_decompressed(name, compressed) {
                    Ok(data) => Some((index, data)),
                    Err(e) => {
                        warn!("skipping unreadable section {}: {}", name, e);
                        None
                    }
                }
            })
            .collect()
    }
}
