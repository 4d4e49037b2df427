//! HWPX (OWPML) XML format parser.
//!
//! HWPX files are ZIP archives of XML documents. The decoder produces the
//! same logical model as the HWP 5.x path, so downstream consumers never
//! distinguish the two.

mod container;
mod section;

pub use container::HwpxContainer;
pub use section::parse_section;

use crate::error::Result;
use crate::model::Document;
use std::io::{Read, Seek};
use std::path::Path;

/// HWPX document parser.
pub struct HwpxParser {
    container: HwpxContainer,
}

impl HwpxParser {
    /// Opens an HWPX document from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let container = HwpxContainer::open(path)?;
        Ok(Self { container })
    }

    /// Opens an HWPX document from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let container = HwpxContainer::from_reader(reader)?;
        Ok(Self { container })
    }

    /// Returns true if the archive passes the HWPX content probe.
    pub fn is_hwpx(&mut self) -> bool {
        self.container.is_hwpx()
    }

    /// Returns the preview text entry, if present.
    pub fn preview_text(&mut self) -> Option<String> {
        self.container.read_preview_text()
    }

    /// Parses the document into the logical model.
    ///
    /// Sections are parsed sequentially in their embedded file-number
    /// order; a section that fails to parse is skipped and the rest
    /// proceed. Parallelism lives at the batch level, never inside one
    /// file's decode.
    pub fn parse(&mut self) -> Result<Document> {
        let section_files = self.container.list_sections();

        let mut document = Document::new();
        for (index, path) in section_files.iter().enumerate() {
            let Ok(xml) = self.container.read_file(path) else {
                continue;
            };
            if let Ok(section) = section::parse_section(&xml, index) {
                document.sections.push(section);
            }
        }

        Ok(document)
    }
}
