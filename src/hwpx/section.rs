//! Section XML parsing for HWPX documents.
//!
//! Section files are OWPML, but producers disagree on namespace usage, so
//! parsing is namespace-tolerant: elements are matched by local name,
//! case-insensitively, and a parse failure triggers one retry with all
//! `xmlns` declarations and element prefixes stripped.

use crate::error::{Error, Result};
use crate::model::{Paragraph, Section, Table, TableCell};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

/// Parses one section XML document into a Section.
pub fn parse_section(xml: &str, index: usize) -> Result<Section> {
    match walk_section(xml, index) {
        Ok(section) => Ok(section),
        Err(first_err) => {
            let stripped = strip_namespaces(xml);
            walk_section(&stripped, index).map_err(|_| first_err)
        }
    }
}

/// Element classes the walker cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Para,
    Table,
    Row,
    Cell,
    Text,
    Other,
}

fn classify(e: &BytesStart) -> Tag {
    let local = e.local_name();
    let name = String::from_utf8_lossy(local.as_ref()).to_lowercase();
    match name.as_str() {
        "p" | "para" | "paragraph" => Tag::Para,
        "tbl" | "table" => Tag::Table,
        "tr" => Tag::Row,
        "tc" => Tag::Cell,
        "t" => Tag::Text,
        _ => Tag::Other,
    }
}

fn classify_end(e: &quick_xml::events::BytesEnd) -> Tag {
    let local = e.local_name();
    let name = String::from_utf8_lossy(local.as_ref()).to_lowercase();
    match name.as_str() {
        "p" | "para" | "paragraph" => Tag::Para,
        "tbl" | "table" => Tag::Table,
        "tr" => Tag::Row,
        "tc" => Tag::Cell,
        "t" => Tag::Text,
        _ => Tag::Other,
    }
}

/// Reads the xml:space attribute, if present.
fn xml_space(e: &BytesStart) -> Option<bool> {
    for attr in e.attributes().flatten() {
        let key = attr.key.as_ref();
        if key == b"xml:space" || key == b"space" {
            return match attr.value.as_ref() {
                b"preserve" => Some(true),
                b"default" => Some(false),
                _ => None,
            };
        }
    }
    None
}

struct SectionWalker {
    section: Section,
    /// xml:space state, inherited down the element stack
    preserve_stack: Vec<bool>,
    t_depth: usize,
    /// Text fragments of a section-level paragraph
    para_parts: Option<Vec<String>>,
    table_depth: usize,
    rows: Vec<Vec<String>>,
    current_row: Option<Vec<String>>,
    in_cell: bool,
    cell_paras: Vec<String>,
    cell_parts: Vec<String>,
}

impl SectionWalker {
    fn new(index: usize) -> Self {
        Self {
            section: Section::new(index),
            preserve_stack: vec![false],
            t_depth: 0,
            para_parts: None,
            table_depth: 0,
            rows: Vec::new(),
            current_row: None,
            in_cell: false,
            cell_paras: Vec::new(),
            cell_parts: Vec::new(),
        }
    }

    fn preserve(&self) -> bool {
        *self.preserve_stack.last().unwrap_or(&false)
    }

    fn on_start(&mut self, e: &BytesStart) {
        let preserve = xml_space(e).unwrap_or_else(|| self.preserve());
        self.preserve_stack.push(preserve);

        match classify(e) {
            Tag::Para => {
                if self.table_depth == 0 {
                    self.para_parts = Some(Vec::new());
                } else if self.in_cell {
                    self.flush_cell_paragraph();
                }
            }
            Tag::Table => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.rows.clear();
                }
            }
            Tag::Row => {
                if self.table_depth == 1 {
                    self.current_row = Some(Vec::new());
                }
            }
            Tag::Cell => {
                if self.table_depth == 1 {
                    self.in_cell = true;
                    self.cell_paras.clear();
                    self.cell_parts.clear();
                }
            }
            Tag::Text => self.t_depth += 1,
            Tag::Other => {}
        }
    }

    fn on_end(&mut self, e: &quick_xml::events::BytesEnd) {
        match classify_end(e) {
            Tag::Text => self.t_depth = self.t_depth.saturating_sub(1),
            Tag::Para => {
                if self.table_depth > 0 {
                    if self.in_cell {
                        self.flush_cell_paragraph();
                    }
                } else if let Some(parts) = self.para_parts.take() {
                    let text = parts.concat();
                    let text = text.trim();
                    if !text.is_empty() {
                        self.section.paragraphs.push(Paragraph::new(text, 0));
                    }
                }
            }
            Tag::Cell => {
                if self.table_depth == 1 && self.in_cell {
                    self.flush_cell_paragraph();
                    let text = self.cell_paras.join("\n");
                    self.cell_paras.clear();
                    if let Some(row) = self.current_row.as_mut() {
                        row.push(text);
                    }
                    self.in_cell = false;
                }
            }
            Tag::Row => {
                if self.table_depth == 1 {
                    self.rows.push(self.current_row.take().unwrap_or_default());
                }
            }
            Tag::Table => {
                self.table_depth = self.table_depth.saturating_sub(1);
                if self.table_depth == 0 {
                    self.finalize_table();
                }
            }
            Tag::Other => {}
        }

        self.preserve_stack.pop();
        if self.preserve_stack.is_empty() {
            self.preserve_stack.push(false);
        }
    }

    fn on_text(&mut self, text: &str) {
        if self.t_depth == 0 {
            return;
        }

        let text = if self.preserve() {
            text.to_string()
        } else {
            text.trim().to_string()
        };
        if text.is_empty() {
            return;
        }

        if self.table_depth > 0 && self.in_cell {
            self.cell_parts.push(text);
        } else if let Some(parts) = self.para_parts.as_mut() {
            parts.push(text);
        }
    }

    /// Joins the buffered `t` runs of one cell paragraph by a space.
    fn flush_cell_paragraph(&mut self) {
        if self.cell_parts.is_empty() {
            return;
        }
        let text = self.cell_parts.join(" ");
        self.cell_parts.clear();
        if !text.trim().is_empty() {
            self.cell_paras.push(text);
        }
    }

    /// Converts the collected row texts into a Table, padding short rows
    /// with empty strings to the widest row.
    fn finalize_table(&mut self) {
        let rows = std::mem::take(&mut self.rows);
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        if rows.is_empty() || width == 0 {
            return;
        }

        let mut table = Table::new(rows.len() as u16, width as u16);
        for (r, row) in rows.into_iter().enumerate() {
            for c in 0..width {
                let text = row.get(c).cloned().unwrap_or_default();
                table.cells.push(TableCell::new(r as u16, c as u16, text));
            }
        }
        self.section.tables.push(table);
    }
}

fn walk_section(xml: &str, index: usize) -> Result<Section> {
    let mut reader = Reader::from_str(xml);
    let mut walker = SectionWalker::new(index);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => walker.on_start(&e),
            Ok(Event::End(e)) => walker.on_end(&e),
            Ok(Event::Text(t)) => {
                if let Ok(s) = t.unescape() {
                    walker.on_text(&s);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::from(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(walker.section)
}

/// Removes xmlns declarations and element prefixes.
///
/// Lossy, so it only runs as the retry path after a failed parse.
fn strip_namespaces(xml: &str) -> String {
    let xmlns = Regex::new(r#"\s+xmlns(:\w+)?="[^"]*""#).expect("static regex");
    let stripped = xmlns.replace_all(xml, "");
    let prefix = Regex::new(r"<(/?)\w+:").expect("static regex");
    prefix.replace_all(&stripped, "<$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_paragraphs() {
        let xml = r#"<sec><p><run><t>Hello</t></run></p><p><run><t>World</t></run></p></sec>"#;
        let section = parse_section(xml, 0).unwrap();
        assert_eq!(section.paragraphs.len(), 2);
        assert_eq!(section.paragraphs[0].text, "Hello");
        assert_eq!(section.paragraphs[1].text, "World");
    }

    #[test]
    fn test_namespaced_paragraphs() {
        let xml = r#"<hs:sec xmlns:hs="http://www.hancom.co.kr/hwpml/2011/section"
                             xmlns:hp="http://www.hancom.co.kr/hwpml/2011/paragraph">
            <hp:p><hp:run><hp:t>본문</hp:t></hp:run></hp:p>
        </hs:sec>"#;
        let section = parse_section(xml, 0).unwrap();
        assert_eq!(section.paragraphs.len(), 1);
        assert_eq!(section.paragraphs[0].text, "본문");
    }

    #[test]
    fn test_case_insensitive_tags() {
        let xml = r#"<SEC><P><T>upper</T></P></SEC>"#;
        let section = parse_section(xml, 0).unwrap();
        assert_eq!(section.paragraphs.len(), 1);
        assert_eq!(section.paragraphs[0].text, "upper");
    }

    #[test]
    fn test_para_alias_tags() {
        let xml = r#"<sec><para><t>a</t></para><paragraph><t>b</t></paragraph></sec>"#;
        let section = parse_section(xml, 0).unwrap();
        assert_eq!(section.paragraphs.len(), 2);
    }

    #[test]
    fn test_table_cells() {
        let xml = r#"<sec><p><tbl>
            <tr><tc><p><t>A</t></p></tc><tc><p><t>B</t></p></tc></tr>
            <tr><tc><p><t>C</t></p></tc><tc><p><t>D</t></p></tc></tr>
        </tbl></p></sec>"#;
        let section = parse_section(xml, 0).unwrap();
        assert_eq!(section.tables.len(), 1);
        let table = &section.tables[0];
        assert_eq!((table.rows, table.cols), (2, 2));
        assert_eq!(table.cell(0, 0).unwrap().text, "A");
        assert_eq!(table.cell(1, 1).unwrap().text, "D");
    }

    #[test]
    fn test_short_rows_padded_to_widest() {
        let xml = r#"<sec><tbl>
            <tr><tc><t>A</t></tc><tc><t>B</t></tc><tc><t>C</t></tc></tr>
            <tr><tc><t>D</t></tc></tr>
        </tbl></sec>"#;
        let section = parse_section(xml, 0).unwrap();
        let table = &section.tables[0];
        assert_eq!((table.rows, table.cols), (2, 3));
        assert_eq!(table.cell(1, 0).unwrap().text, "D");
        assert_eq!(table.cell(1, 2).unwrap().text, "");
    }

    #[test]
    fn test_cell_runs_joined_by_space() {
        let xml = r#"<sec><tbl><tr><tc><p><t>first</t><t>second</t></p></tc></tr></tbl></sec>"#;
        let section = parse_section(xml, 0).unwrap();
        assert_eq!(section.tables[0].cell(0, 0).unwrap().text, "first second");
    }

    #[test]
    fn test_cell_paragraphs_joined_by_newline() {
        let xml = r#"<sec><tbl><tr><tc>
            <p><t>line one</t></p><p><t>line two</t></p>
        </tc></tr></tbl></sec>"#;
        let section = parse_section(xml, 0).unwrap();
        assert_eq!(
            section.tables[0].cell(0, 0).unwrap().text,
            "line one\nline two"
        );
    }

    #[test]
    fn test_cell_paragraph_not_in_section() {
        let xml = r#"<sec>
            <p><t>body</t></p>
            <tbl><tr><tc><p><t>cell</t></p></tc></tr></tbl>
        </sec>"#;
        let section = parse_section(xml, 0).unwrap();
        assert_eq!(section.paragraphs.len(), 1);
        assert_eq!(section.paragraphs[0].text, "body");
    }

    #[test]
    fn test_xml_space_preserve() {
        let xml = r#"<sec><p><t xml:space="preserve">  spaced  out  </t></p></sec>"#;
        let section = parse_section(xml, 0).unwrap();
        // Paragraph-boundary trim still applies; internal runs keep spacing
        assert_eq!(section.paragraphs[0].text, "spaced  out");
    }

    #[test]
    fn test_default_trims_text_nodes() {
        let xml = "<sec><p><t>\n            wrapped\n        </t></p></sec>";
        let section = parse_section(xml, 0).unwrap();
        assert_eq!(section.paragraphs[0].text, "wrapped");
    }

    #[test]
    fn test_preserve_inherited_from_ancestor() {
        let xml = r#"<sec><p xml:space="preserve"><run><t>a  b</t></run></p></sec>"#;
        let section = parse_section(xml, 0).unwrap();
        assert_eq!(section.paragraphs[0].text, "a  b");
    }

    #[test]
    fn test_empty_section() {
        let section = parse_section("<sec/>", 2).unwrap();
        assert_eq!(section.index, 2);
        assert!(section.paragraphs.is_empty());
        assert!(section.tables.is_empty());
    }

    #[test]
    fn test_strip_namespaces() {
        let xml = r#"<hp:p xmlns:hp="urn:x" xmlns="urn:y"><hp:t>x</hp:t></hp:p>"#;
        let stripped = strip_namespaces(xml);
        assert_eq!(stripped, "<p><t>x</t></p>");
    }

    #[test]
    fn test_blank_paragraph_skipped() {
        let xml = r#"<sec><p><t>   </t></p><p><t>kept</t></p></sec>"#;
        let section = parse_section(xml, 0).unwrap();
        assert_eq!(section.paragraphs.len(), 1);
        assert_eq!(section.paragraphs[0].text, "kept");
    }
}
