//! Section structure reconstruction.
//!
//! The record stream is flat; paragraph/table/cell nesting is implicit
//! and has to be recovered from two signals: the per-record level field
//! and the control ids embedded in CTRL_HEADER payloads. A table opens at
//! the level of its CTRL_HEADER and everything inside it sits at a higher
//! level, so the first record whose level falls below the opening level
//! is by definition outside the table. There is no explicit end-of-table
//! token.

use super::record::{Record, RecordIterator, TagId};
use super::text::decode_para_text;
use crate::model::{Paragraph, Section, Table, TableCell};
use log::warn;

/// Control types recognized in CTRL_HEADER payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlType {
    Table,
    Shape,
    Equation,
    Unknown,
}

/// Known 4-character control tokens (forward ASCII order).
const CTRL_TOKENS: [(&[u8; 4], ControlType); 3] = [
    (b"tbl ", ControlType::Table),
    (b"gso ", ControlType::Shape),
    (b"eqed", ControlType::Equation),
];

/// Classifies a CTRL_HEADER payload by its leading control id.
///
/// The id is a u32 stored little-endian, so on disk the ASCII token
/// appears reversed. Some authoring tools have been observed to write the
/// forward order instead; that is accepted with a warning.
fn parse_ctrl_id(data: &[u8]) -> ControlType {
    let Some(id) = data.get(0..4) else {
        return ControlType::Unknown;
    };

    for (token, kind) in CTRL_TOKENS {
        let on_disk = [token[3], token[2], token[1], token[0]];
        if id == on_disk.as_slice() {
            return kind;
        }
        if id == token.as_slice() {
            warn!(
                "control id {:?} in forward byte order; expected little-endian",
                String::from_utf8_lossy(token)
            );
            return kind;
        }
    }

    ControlType::Unknown
}

/// Parses one decompressed section stream into a Section.
pub fn parse_section(data: &[u8], index: usize) -> Section {
    let mut builder = StructureBuilder::new(index);
    for record in RecordIterator::new(data) {
        builder.push_record(&record);
    }
    builder.finish()
}

/// Extracts flat text from a section stream, ignoring table structure.
///
/// Paragraphs are assembled across multi-record splits exactly like the
/// structural pass, then joined by `\n`.
pub fn extract_section_text(data: &[u8]) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut chunks: Vec<String> = Vec::new();

    let mut flush = |chunks: &mut Vec<String>, paragraphs: &mut Vec<String>| {
        if chunks.is_empty() {
            return;
        }
        let text = chunks.concat();
        chunks.clear();
        let text = text.trim();
        if !text.is_empty() {
            paragraphs.push(text.to_string());
        }
    };

    for record in RecordIterator::new(data) {
        match record.tag() {
            TagId::ParaHeader => flush(&mut chunks, &mut paragraphs),
            TagId::ParaText => chunks.push(decode_para_text(record.data)),
            _ => {}
        }
    }
    flush(&mut chunks, &mut paragraphs);

    paragraphs.join("\n")
}

/// State machine that rebuilds one section from its record stream.
struct StructureBuilder {
    section: Section,
    /// Text fragments of the paragraph being assembled
    para_chunks: Vec<String>,
    /// Level of the PARA_HEADER that opened the current paragraph
    para_level: u16,
    in_table: bool,
    /// Level of the CTRL_HEADER that opened the current table
    table_start_level: u16,
    current_table: Option<Table>,
    cursor_row: u16,
    cursor_col: u16,
    in_cell: bool,
    /// Paragraph texts buffered for the current cell
    cell_chunks: Vec<String>,
    dropped_cells: usize,
}

impl StructureBuilder {
    fn new(index: usize) -> Self {
        Self {
            section: Section::new(index),
            para_chunks: Vec::new(),
            para_level: 0,
            in_table: false,
            table_start_level: 0,
            current_table: None,
            cursor_row: 0,
            cursor_col: 0,
            in_cell: false,
            cell_chunks: Vec::new(),
            dropped_cells: 0,
        }
    }

    fn push_record(&mut self, record: &Record<'_>) {
        // A level below the opening CTRL_HEADER means we have left the
        // table, whatever the record is.
        if self.in_table && record.level < self.table_start_level {
            self.finalize_table();
        }

        match record.tag() {
            TagId::ParaHeader => {
                self.finalize_paragraph();
                self.para_level = record.level;
                // Control mask at offset 4..8, read for future use
                let _ctrl_mask = record.read_u32(4).unwrap_or(0);
            }

            TagId::ParaText => {
                let text = decode_para_text(record.data);
                if !text.is_empty() {
                    self.para_chunks.push(text);
                }
            }

            TagId::CtrlHeader => {
                if parse_ctrl_id(record.data) == ControlType::Table {
                    self.finalize_paragraph();
                    if self.in_table {
                        self.finalize_table();
                    }
                    self.in_table = true;
                    self.in_cell = false;
                    self.table_start_level = record.level;
                    self.cursor_row = 0;
                    self.cursor_col = 0;
                    self.cell_chunks.clear();
                }
                // Non-table controls are structurally transparent.
            }

            TagId::Table => {
                let rows = record.read_u16(4).unwrap_or(1);
                let cols = record.read_u16(6).unwrap_or(1);
                self.current_table = Some(Table::new(rows, cols));
                self.cursor_row = 0;
                self.cursor_col = 0;
            }

            TagId::ListHeader => {
                if self.in_table {
                    self.finalize_paragraph();
                    if self.in_cell {
                        self.flush_cell();
                        self.advance_cursor();
                    }
                    self.in_cell = true;
                }
                // Outside a table a LIST_HEADER carries no structure and
                // must not disturb buffered text.
            }

            _ => {}
        }
    }

    fn finish(mut self) -> Section {
        if self.in_table {
            self.finalize_table();
        } else {
            self.finalize_paragraph();
        }

        if self.dropped_cells > 0 {
            warn!(
                "section {}: dropped {} out-of-bounds table cells",
                self.section.index, self.dropped_cells
            );
        }

        self.section
    }

    /// Routes the buffered paragraph to the section or the current cell.
    ///
    /// Whitespace-only paragraphs are discarded.
    fn finalize_paragraph(&mut self) {
        if self.para_chunks.is_empty() {
            return;
        }

        let text = self.para_chunks.concat();
        self.para_chunks.clear();

        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if self.in_table {
            self.cell_chunks.push(text.to_string());
        } else {
            self.section
                .paragraphs
                .push(Paragraph::new(text, self.para_level));
        }
    }

    /// Closes the current table and appends it to the section.
    ///
    /// Any paragraph still buffered at this point belongs to the last
    /// cell, so it is routed there before the cell is flushed.
    fn finalize_table(&mut self) {
        self.finalize_paragraph();
        self.flush_cell();

        if let Some(table) = self.current_table.take() {
            self.section.tables.push(table);
        }
        self.in_table = false;
        self.in_cell = false;
        self.table_start_level = 0;
    }

    /// Emits the buffered cell at the cursor position, bounds permitting.
    fn flush_cell(&mut self) {
        if self.cell_chunks.is_empty() {
            return;
        }

        let text = self.cell_chunks.join("\n");
        self.cell_chunks.clear();

        let Some(table) = self.current_table.as_mut() else {
            return;
        };

        if self.cursor_row < table.rows && self.cursor_col < table.cols {
            table
                .cells
                .push(TableCell::new(self.cursor_row, self.cursor_col, text));
        } else {
            self.dropped_cells += 1;
            warn!(
                "cell ({}, {}) outside declared {}x{} table, dropped",
                self.cursor_row, self.cursor_col, table.rows, table.cols
            );
        }
    }

    /// Advances the cell cursor column-first, wrapping to the next row.
    fn advance_cursor(&mut self) {
        if let Some(table) = &self.current_table {
            self.cursor_col += 1;
            if self.cursor_col >= table.cols {
                self.cursor_col = 0;
                self.cursor_row = self.cursor_row.saturating_add(1);
            }
        }
    }
}
