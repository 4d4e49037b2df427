//! File triage for HWP-family documents.
//!
//! Dispatch is signature-based on the first 32 bytes, with a content
//! probe for ZIP archives: plenty of non-HWPX ZIP files exist, so the ZIP
//! magic alone never classifies.

use crate::error::{Error, Result};
use crate::hwpx::HwpxContainer;
use std::io::Read;
use std::path::Path;

/// Magic bytes for OLE compound files (HWP 5.x)
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Magic bytes for ZIP archives (HWPX)
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Signature of legacy HWP 3.x files at offset 0
const HWP3_SIGNATURE: &[u8] = b"HWP Document File";

/// Supported document format classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// HWP 5.x binary format (OLE container)
    Hwp5,
    /// HWPX XML-based format (ZIP container)
    Hwpx,
    /// Legacy HWP 3.x format (detected, not processed)
    Hwp3,
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatType::Hwp5 => write!(f, "HWP 5.x"),
            FormatType::Hwpx => write!(f, "HWPX"),
            FormatType::Hwp3 => write!(f, "HWP 3.x"),
        }
    }
}

/// Detects the document format of a file.
///
/// Returns `UnknownFormat` for anything that matches no signature, and
/// for ZIP archives that fail the HWPX content probe.
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Result<FormatType> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let mut file = std::fs::File::open(path)?;
    let mut buffer = [0u8; 32];
    let n = file.read(&mut buffer)?;
    drop(file);

    match classify_head(&buffer[..n]) {
        Some(FormatType::Hwpx) => {
            let confirmed = HwpxContainer::open(path)
                .map(|mut c| c.is_hwpx())
                .unwrap_or(false);
            if confirmed {
                Ok(FormatType::Hwpx)
            } else {
                Err(Error::UnknownFormat)
            }
        }
        Some(format) => Ok(format),
        None => Err(Error::UnknownFormat),
    }
}

/// Detects the document format from in-memory bytes.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    let head = &data[..data.len().min(32)];

    match classify_head(head) {
        Some(FormatType::Hwpx) => {
            let confirmed = HwpxContainer::from_bytes(data.to_vec())
                .map(|mut c| c.is_hwpx())
                .unwrap_or(false);
            if confirmed {
                Ok(FormatType::Hwpx)
            } else {
                Err(Error::UnknownFormat)
            }
        }
        Some(format) => Ok(format),
        None => Err(Error::UnknownFormat),
    }
}

/// Signature-only classification of the file head.
fn classify_head(head: &[u8]) -> Option<FormatType> {
    if head.len() >= 8 && head[..8] == OLE_MAGIC {
        return Some(FormatType::Hwp5);
    }
    if head.len() >= 4 && head[..4] == ZIP_MAGIC {
        return Some(FormatType::Hwpx);
    }
    if head.starts_with(HWP3_SIGNATURE) {
        return Some(FormatType::Hwp3);
    }
    None
}
