//! ZIP container wrapper for HWPX documents.

use crate::error::{Error, Result};
use crate::hwp5::DEFAULT_MAX_FILE_SIZE;
use regex::Regex;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// ZIP container wrapper for HWPX files.
pub struct HwpxContainer {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl HwpxContainer {
    /// Opens an HWPX container from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_limit(path, DEFAULT_MAX_FILE_SIZE)
    }

    /// Opens an HWPX container with an explicit file-size ceiling.
    pub fn open_with_limit(path: impl AsRef<Path>, max_size: u64) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let size = std::fs::metadata(path)?.len();
        if size > max_size {
            return Err(Error::TooLarge {
                size,
                limit: max_size,
            });
        }

        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Opens an HWPX container from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Opens an HWPX container from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let cursor = Cursor::new(data);
        let archive = ZipArchive::new(cursor)?;
        Ok(Self { archive })
    }

    /// Returns true if the archive looks like an HWPX document.
    ///
    /// A `mimetype` entry containing `hwp`, a `Contents/header.xml`, or
    /// any `section*.xml` entry qualifies.
    pub fn is_hwpx(&mut self) -> bool {
        if let Ok(mimetype) = self.read_file("mimetype") {
            if mimetype.to_lowercase().contains("hwp") {
                return true;
            }
        }

        if self.file_exists("Contents/header.xml") {
            return true;
        }

        self.entry_names()
            .iter()
            .any(|n| is_section_file(n))
    }

    /// Lists section XML entries sorted by their embedded integer.
    ///
    /// Lexicographic sorting would place `section10.xml` before
    /// `section2.xml`, so names are ordered by the parsed section number.
    pub fn list_sections(&mut self) -> Vec<String> {
        let mut sections: Vec<String> = self
            .entry_names()
            .into_iter()
            .filter(|n| is_section_file(n))
            .collect();

        sections.sort_by_key(|name| section_number(name));
        sections
    }

    /// Reads a file from the archive as UTF-8 text.
    pub fn read_file(&mut self, path: &str) -> Result<String> {
        let mut file = self
            .archive
            .by_name(path)
            .map_err(|_| Error::NotHwp(format!("missing archive entry: {}", path)))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Reads the preview text entry, if one exists.
    pub fn read_preview_text(&mut self) -> Option<String> {
        let candidates: Vec<String> = self
            .entry_names()
            .into_iter()
            .filter(|n| n.to_lowercase().contains("prvtext"))
            .collect();

        for name in candidates {
            if let Ok(content) = self.read_file(&name) {
                let text = content.trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Checks if an entry exists in the archive.
    pub fn file_exists(&mut self, path: &str) -> bool {
        self.archive.by_name(path).is_ok()
    }

    fn entry_names(&mut self) -> Vec<String> {
        (0..self.archive.len())
            .filter_map(|i| self.archive.by_index(i).ok().map(|f| f.name().to_string()))
            .collect()
    }
}

/// Case-insensitive match for section XML entries.
fn is_section_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("section") && lower.ends_with(".xml")
}

/// Extracts the section number from an entry name, 0 if absent.
fn section_number(name: &str) -> u32 {
    let re = Regex::new(r"(?i)section(\d+)\.xml").expect("static regex");
    re.captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(name.to_string(), options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_section_ordering_is_numeric() {
        let data = zip_bytes(&[
            ("mimetype", "application/hwp+zip"),
            ("Contents/section10.xml", "<p/>"),
            ("Contents/section2.xml", "<p/>"),
            ("Contents/section1.xml", "<p/>"),
        ]);

        let mut container = HwpxContainer::from_bytes(data).unwrap();
        let sections = container.list_sections();
        assert_eq!(
            sections,
            vec![
                "Contents/section1.xml",
                "Contents/section2.xml",
                "Contents/section10.xml"
            ]
        );
    }

    #[test]
    fn test_probe_by_mimetype() {
        let data = zip_bytes(&[("mimetype", "application/hwp+zip")]);
        let mut container = HwpxContainer::from_bytes(data).unwrap();
        assert!(container.is_hwpx());
    }

    #[test]
    fn test_probe_by_header_xml() {
        let data = zip_bytes(&[("Contents/header.xml", "<head/>")]);
        let mut container = HwpxContainer::from_bytes(data).unwrap();
        assert!(container.is_hwpx());
    }

    #[test]
    fn test_probe_by_section_entry() {
        let data = zip_bytes(&[("Contents/SECTION0.XML", "<p/>")]);
        let mut container = HwpxContainer::from_bytes(data).unwrap();
        assert!(container.is_hwpx());
    }

    #[test]
    fn test_probe_rejects_plain_zip() {
        let data = zip_bytes(&[("readme.txt", "hello")]);
        let mut container = HwpxContainer::from_bytes(data).unwrap();
        assert!(!container.is_hwpx());
    }

    #[test]
    fn test_rejects_non_zip() {
        assert!(matches!(
            HwpxContainer::from_bytes(b"not a zip".to_vec()),
            Err(Error::NotHwp(_))
        ));
    }

    #[test]
    fn test_preview_text() {
        let data = zip_bytes(&[
            ("mimetype", "application/hwp+zip"),
            ("Preview/PrvText.txt", "  preview body  "),
        ]);
        let mut container = HwpxContainer::from_bytes(data).unwrap();
        assert_eq!(container.read_preview_text().unwrap(), "preview body");
    }
}
