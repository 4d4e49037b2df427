//! OLE container wrapper for HWP 5.x documents.

use crate::error::{Error, Result};
use cfb::CompoundFile;
use flate2::read::DeflateDecoder;
use std::cell::RefCell;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Default file-size ceiling (100 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Safety cap on decompressed section size (zip-bomb resistance).
const MAX_INFLATED_SIZE: u64 = 256 * 1024 * 1024;

/// OLE container wrapper for HWP 5.x documents.
pub struct Hwp5Container {
    cfb: RefCell<CompoundFile<Cursor<Vec<u8>>>>,
}

impl std::fmt::Debug for Hwp5Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hwp5Container").finish_non_exhaustive()
    }
}

impl Hwp5Container {
    /// Opens an HWP 5.x container from a file path.
    ///
    /// Fails with `NotFound` if the path does not exist, `TooLarge` if the
    /// file exceeds the default size ceiling, and `NotHwp` if the bytes do
    /// not form an OLE compound file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_limit(path, DEFAULT_MAX_FILE_SIZE)
    }

    /// Opens a container with an explicit file-size ceiling.
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

    /// Opens a container from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Opens a container from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let cursor = Cursor::new(data);
        let cfb = CompoundFile::open(cursor).map_err(|e| Error::NotHwp(e.to_string()))?;
        Ok(Self {
            cfb: RefCell::new(cfb),
        })
    }

    /// Reads and parses the FileHeader stream (always uncompressed).
    pub fn read_file_header(&self) -> Result<super::FileHeader> {
        let data = self.read_stream_raw("FileHeader")?;
        super::FileHeader::parse(&data)
    }

    /// Checks if a stream exists.
    pub fn stream_exists(&self, name: &str) -> bool {
        self.cfb.borrow().exists(name)
    }

    /// Reads a raw stream without decompression.
    pub fn read_stream_raw(&self, name: &str) -> Result<Vec<u8>> {
        let mut cfb = self.cfb.borrow_mut();

        let mut stream = cfb
            .open_stream(name)
            .map_err(|_| Error::NotHwp(format!("missing stream: {}", name)))?;

        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Reads a stream, applying raw deflate when `compressed` is set.
    ///
    /// Some authoring tools mis-flag uncompressed payloads, so a deflate
    /// failure falls back to the raw bytes rather than erroring.
    pub fn read_stream_decompressed(&self, name: &str, compressed: bool) -> Result<Vec<u8>> {
        let raw = self.read_stream_raw(name)?;

        if compressed {
            Ok(decompress_stream(&raw).unwrap_or(raw))
        } else {
            Ok(raw)
        }
    }

    /// Lists BodyText section stream names in ascending index order.
    pub fn list_bodytext_sections(&self) -> Vec<String> {
        let mut sections = Vec::new();
        let mut index = 0;

        loop {
            let name = format!("BodyText/Section{}", index);
            if self.stream_exists(&name) {
                sections.push(name);
                index += 1;
            } else {
                break;
            }
        }

        sections
    }

    /// Reads the preview text (PrvText) if present.
    ///
    /// PrvText is uncompressed UTF-16LE holding the first few kilobytes of
    /// the document.
    pub fn read_preview_text(&self) -> Option<String> {
        if !self.stream_exists("PrvText") {
            return None;
        }

        let data = self.read_stream_raw("PrvText").ok()?;
        if data.is_empty() {
            return None;
        }

        let units: Vec<u16> = data
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        let text = String::from_utf16_lossy(&units)
            .replace('\u{0}', "")
            .trim()
            .to_string();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Lists all stream paths in the container.
    pub fn list_streams(&self) -> Vec<String> {
        let cfb = self.cfb.borrow();
        cfb.walk()
            .filter(|entry| entry.is_stream())
            .map(|entry| entry.path().to_string_lossy().trim_start_matches('/').to_string())
            .collect()
    }
}

/// Decompresses a raw-deflate stream, bounded by the inflate cap.
fn decompress_stream(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data).take(MAX_INFLATED_SIZE);
    let mut output = Vec::new();

    decoder
        .read_to_end(&mut output)
        .map_err(|e| Error::Corrupt(format!("deflate: {}", e)))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decompress_roundtrip() {
        let original = b"BodyText section payload".to_vec();
        let compressed = deflate(&original);
        assert_eq!(decompress_stream(&compressed).unwrap(), original);
    }

    #[test]
    fn test_decompress_garbage_fails() {
        assert!(decompress_stream(&[0xFF, 0x00, 0xAB]).is_err());
    }

    #[test]
    fn test_open_missing_file() {
        let err = Hwp5Container::open("/nonexistent/file.hwp").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_open_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.hwp");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let err = Hwp5Container::open_with_limit(&path, 16).unwrap_err();
        assert!(matches!(err, Error::TooLarge { size: 64, limit: 16 }));
    }

    #[test]
    fn test_open_rejects_non_ole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.hwp");
        std::fs::write(&path, b"just some text").unwrap();

        let err = Hwp5Container::open(&path).unwrap_err();
        assert!(matches!(err, Error::NotHwp(_)));
    }
}
