//! Table structures for the document model.

use serde::Serialize;

/// A table with declared dimensions and a sparse cell set.
///
/// `rows` and `cols` are the authoritative dimensions from the TABLE
/// record (or the observed grid for HWPX); cells outside them are never
/// stored. Cell traversal order is row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Declared row count (≥ 1)
    pub rows: u16,
    /// Declared column count (≥ 1)
    pub cols: u16,
    /// Cells in encounter order
    pub cells: Vec<TableCell>,
}

impl Table {
    /// Creates an empty table, clamping dimensions to a minimum of 1.
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
            cells: Vec::new(),
        }
    }

    /// Returns the cell at the given position, if one was stored.
    pub fn cell(&self, row: u16, col: u16) -> Option<&TableCell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    /// Renders the table as a dense row-major grid of cell texts.
    ///
    /// Positions with no stored cell are empty strings.
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        let mut grid = vec![vec![String::new(); self.cols as usize]; self.rows as usize];
        for cell in &self.cells {
            if cell.row < self.rows && cell.col < self.cols {
                grid[cell.row as usize][cell.col as usize] = cell.text.clone();
            }
        }
        grid
    }
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCell {
    /// 0-based row position
    pub row: u16,
    /// 0-based column position
    pub col: u16,
    /// Newline-joined text of the cell's paragraphs
    pub text: String,
    /// Rows spanned (default 1)
    pub row_span: u16,
    /// Columns spanned (default 1)
    pub col_span: u16,
}

impl TableCell {
    /// Creates a 1x1 cell at the given position.
    pub fn new(row: u16, col: u16, text: impl Into<String>) -> Self {
        Self {
            row,
            col,
            text: text.into(),
            row_span: 1,
            col_span: 1,
        }
    }
}
