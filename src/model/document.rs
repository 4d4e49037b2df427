//! Document and section structures.

use super::{Paragraph, Table};
use serde::Serialize;

/// A complete document parsed from HWP/HWPX.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Sections in stream-discovery order
    pub sections: Vec<Section>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of paragraphs across all sections.
    pub fn paragraph_count(&self) -> usize {
        self.sections.iter().map(|s| s.paragraphs.len()).sum()
    }

    /// Returns all tables of the document in section order.
    pub fn all_tables(&self) -> Vec<&Table> {
        self.sections.iter().flat_map(|s| s.tables.iter()).collect()
    }

    /// Flattens the document to plain text.
    ///
    /// Paragraph texts are joined by `\n`, skipping whitespace-only
    /// paragraphs. Table content is not included.
    pub fn flat_text(&self) -> String {
        let mut texts = Vec::new();
        for section in &self.sections {
            for para in &section.paragraphs {
                if !para.is_blank() {
                    texts.push(para.text.as_str());
                }
            }
        }
        texts.join("\n")
    }
}

/// A section of the document.
///
/// Paragraphs and tables each keep their own encounter order; a paragraph
/// belongs either to the section directly or to a cell of one of the
/// section's tables, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Section index (0-based)
    pub index: usize,
    /// Body paragraphs in stream order
    pub paragraphs: Vec<Paragraph>,
    /// Tables in stream order
    pub tables: Vec<Table>,
}

impl Section {
    /// Creates a new empty section.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            paragraphs: Vec::new(),
            tables: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_text_skips_blank_paragraphs() {
        let mut doc = Document::new();
        let mut section = Section::new(0);
        section.paragraphs.push(Paragraph::new("Line 1", 0));
        section.paragraphs.push(Paragraph::new("   ", 0));
        section.paragraphs.push(Paragraph::new("Line 2", 0));
        doc.sections.push(section);

        assert_eq!(doc.flat_text(), "Line 1\nLine 2");
    }

    #[test]
    fn test_all_tables_in_section_order() {
        let mut doc = Document::new();
        let mut s0 = Section::new(0);
        s0.tables.push(Table::new(2, 2));
        let mut s1 = Section::new(1);
        s1.tables.push(Table::new(3, 3));
        doc.sections.push(s0);
        doc.sections.push(s1);

        let tables = doc.all_tables();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows, 2);
        assert_eq!(tables[1].rows, 3);
    }
}
