//! Extraction strategies over the format-specific parsers.
//!
//! Text extraction prefers the cheap preview stream and falls back to a
//! full body parse; structure extraction always takes the body path.
//! Failures of any kind fold into an unsuccessful result so batch runs
//! never abort on a single bad file.

use crate::detect::{detect_format_from_path, FormatType};
use crate::error::{Error, Result};
use crate::hwp5::{Hwp5Parser, HwpMetadata};
use crate::hwpx::HwpxParser;
use crate::model::Document;
use serde::Serialize;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// How a result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// HWP 5.x preview stream
    Prvtext,
    /// HWP 5.x body records
    Bodytext,
    /// HWPX preview or section text
    Hwpx,
    /// HWP 5.x structural parse
    Hwp5Structure,
    /// HWPX structural parse
    HwpxStructure,
    /// Extraction did not succeed
    Failed,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Method::Prvtext => "prvtext",
            Method::Bodytext => "bodytext",
            Method::Hwpx => "hwpx",
            Method::Hwp5Structure => "hwp5_structure",
            Method::HwpxStructure => "hwpx_structure",
            Method::Failed => "failed",
        };
        write!(f, "{}", tag)
    }
}

/// Outcome of a flat-text extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractResult {
    /// Source file path
    pub filepath: String,
    /// Whether extraction succeeded
    pub success: bool,
    /// Extracted text on success
    pub text: Option<String>,
    /// Extraction method used
    pub method: Method,
    /// Error description on failure
    pub error: Option<String>,
    /// HWP 5.x container metadata, when available
    pub metadata: Option<HwpMetadata>,
    /// Character count of the extracted text
    pub char_count: usize,
    /// ISO-8601 timestamp of the extraction
    pub extracted_at: String,
}

impl ExtractResult {
    fn success(
        filepath: String,
        text: String,
        method: Method,
        metadata: Option<HwpMetadata>,
    ) -> Self {
        let char_count = text.chars().count();
        Self {
            filepath,
            success: true,
            text: Some(text),
            method,
            error: None,
            metadata,
            char_count,
            extracted_at: now_iso8601(),
        }
    }

    /// Builds a failed result from an error.
    pub fn failure(filepath: String, error: &Error) -> Self {
        Self {
            filepath,
            success: false,
            text: None,
            method: Method::Failed,
            error: Some(error.to_string()),
            metadata: None,
            char_count: 0,
            extracted_at: now_iso8601(),
        }
    }
}

/// Outcome of a structure-preserving extraction.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredResult {
    /// Source file path
    pub filepath: String,
    /// Whether extraction succeeded
    pub success: bool,
    /// Extraction method used
    pub method: Method,
    /// The logical document on success
    pub document: Option<Document>,
    /// Flattened text of the document
    pub text: Option<String>,
    /// Error description on failure
    pub error: Option<String>,
    /// HWP 5.x container metadata, when available
    pub metadata: Option<HwpMetadata>,
    /// ISO-8601 timestamp of the extraction
    pub extracted_at: String,
}

/// Extracts flat text from an HWP/HWPX file.
///
/// For HWP 5.x the PrvText stream is tried first (method `prvtext`); the
/// body-record path is the fallback (method `bodytext`).
pub fn extract_text(path: impl AsRef<Path>) -> ExtractResult {
    let path = path.as_ref();
    let filepath = path.to_string_lossy().into_owned();

    match try_extract_text(path) {
        Ok((text, method, metadata)) => ExtractResult::success(filepath, text, method, metadata),
        Err(e) => ExtractResult::failure(filepath, &e),
    }
}

fn try_extract_text(path: &Path) -> Result<(String, Method, Option<HwpMetadata>)> {
    match detect_format_from_path(path)? {
        FormatType::Hwpx => {
            let mut parser = HwpxParser::open(path)?;
            if let Some(text) = parser.preview_text() {
                return Ok((text, Method::Hwpx, None));
            }
            let text = parser.parse()?.flat_text();
            if text.is_empty() {
                return Err(Error::Corrupt("no text in section files".into()));
            }
            Ok((text, Method::Hwpx, None))
        }
        FormatType::Hwp5 => {
            let parser = Hwp5Parser::open(path)?;
            let metadata = Some(parser.metadata().clone());
            if let Some(text) = parser.preview_text() {
                return Ok((text, Method::Prvtext, metadata));
            }
            let text = parser.body_text()?;
            if text.is_empty() {
                return Err(Error::Corrupt("no text in body sections".into()));
            }
            Ok((text, Method::Bodytext, metadata))
        }
        FormatType::Hwp3 => Err(Error::Unsupported("HWP 3.x".into())),
    }
}

/// Extracts the structural document model from an HWP/HWPX file.
///
/// Always takes the body path; the preview stream carries no structure.
pub fn extract_structure(path: impl AsRef<Path>) -> StructuredResult {
    let path = path.as_ref();
    let filepath = path.to_string_lossy().into_owned();

    match try_extract_structure(path) {
        Ok((document, method, metadata)) => {
            let text = document.flat_text();
            StructuredResult {
                filepath,
                success: true,
                method,
                document: Some(document),
                text: Some(text),
                error: None,
                metadata,
                extracted_at: now_iso8601(),
            }
        }
        Err(e) => StructuredResult {
            filepath,
            success: false,
            method: Method::Failed,
            document: None,
            text: None,
            error: Some(e.to_string()),
            metadata: None,
            extracted_at: now_iso8601(),
        },
    }
}

fn try_extract_structure(path: &Path) -> Result<(Document, Method, Option<HwpMetadata>)> {
    match detect_format_from_path(path)? {
        FormatType::Hwpx => {
            let mut parser = HwpxParser::open(path)?;
            let document = parser.parse()?;
            if document.sections.is_empty() {
                return Err(Error::Corrupt("no section files".into()));
            }
            Ok((document, Method::HwpxStructure, None))
        }
        FormatType::Hwp5 => {
            let parser = Hwp5Parser::open(path)?;
            let metadata = Some(parser.metadata().clone());
            let document = parser.parse()?;
            if document.sections.is_empty() {
                return Err(Error::Corrupt("no body sections".into()));
            }
            Ok((document, Method::Hwp5Structure, metadata))
        }
        FormatType::Hwp3 => Err(Error::Unsupported("HWP 3.x".into())),
    }
}

/// Formats the current time as an ISO-8601 UTC timestamp.
pub(crate) fn now_iso8601() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    unix_secs_to_iso8601(secs)
}

/// Converts seconds since the Unix epoch to ISO-8601.
fn unix_secs_to_iso8601(secs: u64) -> String {
    let days = secs / 86400;
    let time_secs = secs % 86400;
    let h = time_secs / 3600;
    let m = (time_secs % 3600) / 60;
    let s = time_secs % 60;
    let (year, month, day) = days_to_ymd(days);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year, month, day, h, m, s
    )
}

/// Converts days since the Unix epoch to (year, month, day).
fn days_to_ymd(mut days: u64) -> (u32, u32, u32) {
    let mut year = 1970u32;
    loop {
        let days_in_year = if is_leap(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }
    let leap = is_leap(year);
    let month_days: [u64; 12] = [
        31,
        if leap { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];
    let mut month = 1u32;
    for &md in &month_days {
        if days < md {
            break;
        }
        days -= md;
        month += 1;
    }
    (year, month, days as u32 + 1)
}

#[inline]
fn is_leap(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_file_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.hwp");
        std::fs::write(&path, b"this is not an hwp file at all").unwrap();

        let result = extract_text(&path);
        assert!(!result.success);
        assert_eq!(result.method, Method::Failed);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_missing_file_fails_cleanly() {
        let result = extract_text("/no/such/path.hwp");
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not found"));
    }

    #[test]
    fn test_hwp3_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.hwp");
        let mut data = b"HWP Document File V3.00".to_vec();
        data.resize(128, 0);
        std::fs::write(&path, data).unwrap();

        let result = extract_text(&path);
        assert!(!result.success);
        assert!(result.error.unwrap().contains("unsupported"));
    }

    #[test]
    fn test_method_tags() {
        assert_eq!(Method::Prvtext.to_string(), "prvtext");
        assert_eq!(Method::Bodytext.to_string(), "bodytext");
        assert_eq!(Method::Failed.to_string(), "failed");
        assert_eq!(Method::Hwp5Structure.to_string(), "hwp5_structure");
    }

    #[test]
    fn test_unix_secs_to_iso8601() {
        assert_eq!(unix_secs_to_iso8601(0), "1970-01-01T00:00:00Z");
        // 2020-02-29 12:00:00 UTC (leap day)
        assert_eq!(unix_secs_to_iso8601(1_582_977_600), "2020-02-29T12:00:00Z");
    }
}
